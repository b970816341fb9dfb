//! District atlas backend: catalogue of districts and gram panchayats with
//! header image storage, plus the client-side atlas controller library.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;
