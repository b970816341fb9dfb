mod district;

pub use district::{District, DistrictFields, DistrictStatus, FamousPersonality, TouristPlace};
