use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::gram_panchayats::handlers;
use crate::features::gram_panchayats::services::GramPanchayatService;

/// Create routes for the gram panchayats feature
///
/// GET routes are public; mutations require the admin role.
pub fn routes(service: Arc<GramPanchayatService>) -> Router {
    Router::new()
        .route(
            "/api/gram-panchayats",
            get(handlers::list_gram_panchayats).post(handlers::create_gram_panchayat),
        )
        .route(
            "/api/gram-panchayat/{id}",
            get(handlers::get_gram_panchayat)
                .put(handlers::update_gram_panchayat)
                .delete(handlers::delete_gram_panchayat),
        )
        .with_state(service)
}
