use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::JsonOrMultipart;
use crate::features::auth::RequireAdmin;
use crate::features::gram_panchayats::dtos::{
    CreateGramPanchayatDto, GramPanchayatDeletionSummary, GramPanchayatResponseDto,
    ListGramPanchayatsQuery, UpdateGramPanchayatDto,
};
use crate::features::gram_panchayats::services::GramPanchayatService;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::parse_id;

/// List gram panchayats
#[utoipa::path(
    get,
    path = "/api/gram-panchayats",
    params(ListGramPanchayatsQuery),
    responses(
        (status = 200, description = "List of gram panchayats", body = ApiResponse<Vec<GramPanchayatResponseDto>>),
    ),
    tag = "gram-panchayats"
)]
pub async fn list_gram_panchayats(
    State(service): State<Arc<GramPanchayatService>>,
    Query(query): Query<ListGramPanchayatsQuery>,
) -> Result<Json<ApiResponse<Vec<GramPanchayatResponseDto>>>> {
    let (items, total) = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Get gram panchayat by ID, with its district
#[utoipa::path(
    get,
    path = "/api/gram-panchayat/{id}",
    params(
        ("id" = String, Path, description = "Gram panchayat ID (UUID)")
    ),
    responses(
        (status = 200, description = "Gram panchayat found", body = ApiResponse<GramPanchayatResponseDto>),
        (status = 400, description = "Invalid gram panchayat ID"),
        (status = 404, description = "Gram panchayat not found")
    ),
    tag = "gram-panchayats"
)]
pub async fn get_gram_panchayat(
    State(service): State<Arc<GramPanchayatService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GramPanchayatResponseDto>>> {
    let id = parse_id(&id, "gram panchayat")?;
    let gp = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(gp), None, None)))
}

/// Create gram panchayat (admin)
///
/// Accepts JSON or multipart. The parent district must exist.
#[utoipa::path(
    post,
    path = "/api/gram-panchayats",
    request_body(content = CreateGramPanchayatDto, content_type = "application/json"),
    responses(
        (status = 201, description = "Gram panchayat created", body = ApiResponse<GramPanchayatResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "District not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "gram-panchayats"
)]
pub async fn create_gram_panchayat(
    State(service): State<Arc<GramPanchayatService>>,
    RequireAdmin(user): RequireAdmin,
    body: JsonOrMultipart<CreateGramPanchayatDto>,
) -> Result<(StatusCode, Json<ApiResponse<GramPanchayatResponseDto>>)> {
    let (dto, image) = CreateGramPanchayatDto::from_body(body).await?;
    let gp = service.create(&user, dto, image).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(gp),
            Some("Gram panchayat created successfully".to_string()),
            None,
        )),
    ))
}

/// Update gram panchayat (admin)
#[utoipa::path(
    put,
    path = "/api/gram-panchayat/{id}",
    params(
        ("id" = String, Path, description = "Gram panchayat ID (UUID)")
    ),
    request_body(content = UpdateGramPanchayatDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Gram panchayat updated", body = ApiResponse<GramPanchayatResponseDto>),
        (status = 400, description = "Invalid ID, payload or image"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Gram panchayat or district not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "gram-panchayats"
)]
pub async fn update_gram_panchayat(
    State(service): State<Arc<GramPanchayatService>>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
    body: JsonOrMultipart<UpdateGramPanchayatDto>,
) -> Result<Json<ApiResponse<GramPanchayatResponseDto>>> {
    let id = parse_id(&id, "gram panchayat")?;
    let existing = service.find(id).await?;
    let (patch, image) = UpdateGramPanchayatDto::from_body(body).await?;
    tracing::debug!("Gram panchayat {} update requested by {}", id, user.sub);

    let gp = service.update(existing, patch, image).await?;
    Ok(Json(ApiResponse::success(
        Some(gp),
        Some("Gram panchayat updated successfully".to_string()),
        None,
    )))
}

/// Delete gram panchayat (admin)
#[utoipa::path(
    delete,
    path = "/api/gram-panchayat/{id}",
    params(
        ("id" = String, Path, description = "Gram panchayat ID (UUID)")
    ),
    responses(
        (status = 200, description = "Gram panchayat deleted", body = ApiResponse<GramPanchayatDeletionSummary>),
        (status = 400, description = "Invalid gram panchayat ID"),
        (status = 401, description = "Invalid bearer token"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Gram panchayat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "gram-panchayats"
)]
pub async fn delete_gram_panchayat(
    State(service): State<Arc<GramPanchayatService>>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GramPanchayatDeletionSummary>>> {
    let id = parse_id(&id, "gram panchayat")?;
    tracing::debug!("Gram panchayat {} delete requested by {}", id, user.sub);

    let summary = service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        Some(summary),
        Some("Gram panchayat deleted successfully".to_string()),
        None,
    )))
}
