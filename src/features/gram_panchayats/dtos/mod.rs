pub mod gram_panchayat_dto;

pub use gram_panchayat_dto::{
    CreateGramPanchayatDto, GramPanchayatDeletionSummary, GramPanchayatResponseDto,
    GramPanchayatSummaryDto, ListGramPanchayatsQuery, UpdateGramPanchayatDto,
};
