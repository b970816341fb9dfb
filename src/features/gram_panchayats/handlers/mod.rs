mod gram_panchayat_handler;

pub use gram_panchayat_handler::*;
