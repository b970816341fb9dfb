pub mod district_dto;

pub use district_dto::{
    CreateDistrictDto, DistrictDeletionSummary, DistrictDetailDto, DistrictMapPointDto,
    DistrictRefDto, DistrictResponseDto, ListDistrictsQuery, UpdateDistrictDto,
};
