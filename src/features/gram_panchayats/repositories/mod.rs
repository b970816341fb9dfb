mod gram_panchayat_repository;

pub use gram_panchayat_repository::{
    GramPanchayatFilter, GramPanchayatRepository, PgGramPanchayatRepository,
};
