pub mod atlas;
pub mod auth;
pub mod districts;
pub mod gram_panchayats;
