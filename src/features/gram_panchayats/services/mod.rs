mod gram_panchayat_service;

pub use gram_panchayat_service::GramPanchayatService;
