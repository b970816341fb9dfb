mod gram_panchayat;

pub use gram_panchayat::{GramPanchayat, GramPanchayatFields, GramPanchayatStatus};
