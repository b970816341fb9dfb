use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::JsonOrMultipart;
use crate::features::auth::RequireAdmin;
use crate::features::districts::dtos::{
    CreateDistrictDto, DistrictDeletionSummary, DistrictDetailDto, DistrictMapPointDto,
    DistrictResponseDto, ListDistrictsQuery, UpdateDistrictDto,
};
use crate::features::districts::services::DistrictService;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::parse_id;

/// List districts
///
/// Paginated, optionally filtered by status and a case-insensitive name search.
#[utoipa::path(
    get,
    path = "/api/districts",
    params(ListDistrictsQuery),
    responses(
        (status = 200, description = "List of districts", body = ApiResponse<Vec<DistrictResponseDto>>),
    ),
    tag = "districts"
)]
pub async fn list_districts(
    State(service): State<Arc<DistrictService>>,
    Query(query): Query<ListDistrictsQuery>,
) -> Result<Json<ApiResponse<Vec<DistrictResponseDto>>>> {
    let (districts, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(districts),
        None,
        Some(Meta { total }),
    )))
}

/// Map markers
///
/// Active districts that have coordinates, with their gram panchayat counts.
#[utoipa::path(
    get,
    path = "/api/districts/map",
    responses(
        (status = 200, description = "Map points", body = ApiResponse<Vec<DistrictMapPointDto>>),
    ),
    tag = "districts"
)]
pub async fn list_map_points(
    State(service): State<Arc<DistrictService>>,
) -> Result<Json<ApiResponse<Vec<DistrictMapPointDto>>>> {
    let points = service.map_points().await?;
    Ok(Json(ApiResponse::success(Some(points), None, None)))
}

/// Get district by ID
#[utoipa::path(
    get,
    path = "/api/district/{id}",
    params(
        ("id" = String, Path, description = "District ID (UUID)")
    ),
    responses(
        (status = 200, description = "District found", body = ApiResponse<DistrictDetailDto>),
        (status = 400, description = "Invalid district ID"),
        (status = 404, description = "District not found")
    ),
    tag = "districts"
)]
pub async fn get_district(
    State(service): State<Arc<DistrictService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DistrictDetailDto>>> {
    let id = parse_id(&id, "district")?;
    let district = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(district), None, None)))
}

/// Get district by slug
#[utoipa::path(
    get,
    path = "/api/districts/slug/{slug}",
    params(
        ("slug" = String, Path, description = "District slug")
    ),
    responses(
        (status = 200, description = "District found", body = ApiResponse<DistrictDetailDto>),
        (status = 404, description = "District not found")
    ),
    tag = "districts"
)]
pub async fn get_district_by_slug(
    State(service): State<Arc<DistrictService>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<DistrictDetailDto>>> {
    let district = service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(Some(district), None, None)))
}

/// Create district (admin)
///
/// Accepts `application/json` or `multipart/form-data`. Multipart forms
/// send tag lists as comma-separated text, embedded lists as JSON text and
/// the header image as a `headerImage` file or `uploadMethod=url` +
/// `headerImageUrl`.
#[utoipa::path(
    post,
    path = "/api/districts",
    request_body(content = CreateDistrictDto, content_type = "application/json"),
    responses(
        (status = 201, description = "District created", body = ApiResponse<DistrictDetailDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Slug or name already in use"),
        (status = 502, description = "Image store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "districts"
)]
pub async fn create_district(
    State(service): State<Arc<DistrictService>>,
    RequireAdmin(user): RequireAdmin,
    body: JsonOrMultipart<CreateDistrictDto>,
) -> Result<(StatusCode, Json<ApiResponse<DistrictDetailDto>>)> {
    let (dto, image) = CreateDistrictDto::from_body(body).await?;
    tracing::debug!("District create requested by {}", user.sub);

    let district = service.create(dto, image).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(district),
            Some("District created successfully".to_string()),
            None,
        )),
    ))
}

/// Update district (admin)
///
/// Partial update: only the fields present in the body are changed.
/// Same body formats as create.
#[utoipa::path(
    put,
    path = "/api/district/{id}",
    params(
        ("id" = String, Path, description = "District ID (UUID)")
    ),
    request_body(content = UpdateDistrictDto, content_type = "application/json"),
    responses(
        (status = 200, description = "District updated", body = ApiResponse<DistrictDetailDto>),
        (status = 400, description = "Invalid ID, payload or image"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "District not found"),
        (status = 409, description = "Slug or name already in use"),
        (status = 413, description = "Upload too large"),
        (status = 502, description = "Image store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "districts"
)]
pub async fn update_district(
    State(service): State<Arc<DistrictService>>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
    body: JsonOrMultipart<UpdateDistrictDto>,
) -> Result<Json<ApiResponse<DistrictDetailDto>>> {
    let id = parse_id(&id, "district")?;
    let existing = service.find(id).await?;
    let (patch, image) = UpdateDistrictDto::from_body(body).await?;
    tracing::debug!("District {} update requested by {}", id, user.sub);

    let district = service.update(existing, patch, image).await?;
    Ok(Json(ApiResponse::success(
        Some(district),
        Some("District updated successfully".to_string()),
        None,
    )))
}

/// Delete district (admin)
///
/// Cascades to the district's gram panchayats and best-effort deletes every
/// hosted image the district and its panchayats reference.
#[utoipa::path(
    delete,
    path = "/api/district/{id}",
    params(
        ("id" = String, Path, description = "District ID (UUID)")
    ),
    responses(
        (status = 200, description = "District deleted", body = ApiResponse<DistrictDeletionSummary>),
        (status = 400, description = "Invalid district ID"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "District not found")
    ),
    security(("bearer_auth" = [])),
    tag = "districts"
)]
pub async fn delete_district(
    State(service): State<Arc<DistrictService>>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DistrictDeletionSummary>>> {
    let id = parse_id(&id, "district")?;
    tracing::debug!("District {} delete requested by {}", id, user.sub);

    let summary = service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("District deleted successfully".to_string()),
        None,
    )))
}
