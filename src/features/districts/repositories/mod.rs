mod district_repository;

pub(crate) use district_repository::map_write_error;
pub use district_repository::{DistrictFilter, DistrictRepository, PgDistrictRepository};
