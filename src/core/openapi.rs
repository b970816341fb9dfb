use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::districts::{
    dtos as districts_dtos, handlers as districts_handlers, models as districts_models,
};
use crate::features::gram_panchayats::{
    dtos as gram_panchayats_dtos, handlers as gram_panchayats_handlers,
    models as gram_panchayats_models,
};
use crate::modules::storage::ImageCleanupSummary;
use crate::shared::types::{Coordinates, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Districts
        districts_handlers::list_districts,
        districts_handlers::list_map_points,
        districts_handlers::get_district,
        districts_handlers::get_district_by_slug,
        districts_handlers::create_district,
        districts_handlers::update_district,
        districts_handlers::delete_district,
        // Gram panchayats
        gram_panchayats_handlers::list_gram_panchayats,
        gram_panchayats_handlers::get_gram_panchayat,
        gram_panchayats_handlers::create_gram_panchayat,
        gram_panchayats_handlers::update_gram_panchayat,
        gram_panchayats_handlers::delete_gram_panchayat,
    ),
    components(
        schemas(
            Meta,
            Coordinates,
            ImageCleanupSummary,
            // Districts
            districts_models::DistrictStatus,
            districts_models::TouristPlace,
            districts_models::FamousPersonality,
            districts_dtos::CreateDistrictDto,
            districts_dtos::UpdateDistrictDto,
            districts_dtos::DistrictResponseDto,
            districts_dtos::DistrictDetailDto,
            districts_dtos::DistrictMapPointDto,
            districts_dtos::DistrictRefDto,
            districts_dtos::DistrictDeletionSummary,
            // Gram panchayats
            gram_panchayats_models::GramPanchayatStatus,
            gram_panchayats_dtos::CreateGramPanchayatDto,
            gram_panchayats_dtos::UpdateGramPanchayatDto,
            gram_panchayats_dtos::GramPanchayatResponseDto,
            gram_panchayats_dtos::GramPanchayatSummaryDto,
            gram_panchayats_dtos::GramPanchayatDeletionSummary,
        )
    ),
    tags(
        (name = "districts", description = "District catalogue (reads public, writes admin only)"),
        (name = "gram-panchayats", description = "Gram panchayats within districts (reads public, writes admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "District Atlas API",
        version = "0.1.0",
        description = "API documentation for the district atlas",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
