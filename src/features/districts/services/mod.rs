mod district_service;

pub use district_service::DistrictService;
