use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::districts::handlers;
use crate::features::districts::services::DistrictService;

/// Create routes for the districts feature
///
/// GET routes are public. POST/PUT/DELETE require the admin role, checked by
/// the `RequireAdmin` extractor on top of the bearer auth middleware.
pub fn routes(service: Arc<DistrictService>) -> Router {
    Router::new()
        .route(
            "/api/districts",
            get(handlers::list_districts).post(handlers::create_district),
        )
        .route("/api/districts/map", get(handlers::list_map_points))
        .route(
            "/api/districts/slug/{slug}",
            get(handlers::get_district_by_slug),
        )
        .route(
            "/api/district/{id}",
            get(handlers::get_district)
                .put(handlers::update_district)
                .delete(handlers::delete_district),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::features::districts::models::DistrictStatus;
    use crate::features::districts::repositories::DistrictRepository;
    use crate::features::gram_panchayats::repositories::GramPanchayatRepository;
    use crate::modules::storage::{ImageManager, ImagePolicy};
    use crate::shared::test_helpers::{
        create_viewer_user, fake_district_fields, fake_gram_panchayat_fields, png_bytes,
        with_admin_auth, with_user, TestStores,
    };

    fn router(stores: &TestStores, policy: ImagePolicy) -> Router {
        let images = Arc::new(ImageManager::new(stores.images.clone(), policy));
        routes(Arc::new(DistrictService::new(
            stores.districts.clone(),
            stores.gram_panchayats.clone(),
            images,
        )))
    }

    fn admin_server(stores: &TestStores) -> TestServer {
        TestServer::new(with_admin_auth(router(stores, ImagePolicy::default()))).unwrap()
    }

    #[tokio::test]
    async fn test_update_without_admin_role_is_forbidden() {
        let stores = TestStores::default();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let server = TestServer::new(with_user(
            router(&stores, ImagePolicy::default()),
            create_viewer_user(),
        ))
        .unwrap();

        let response = server
            .put(&format!("/api/district/{}", existing.id))
            .json(&json!({ "name": "Hijacked" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let stored = stores.districts.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(stored.name, existing.name);
    }

    #[tokio::test]
    async fn test_anonymous_mutations_are_forbidden() {
        let stores = TestStores::default();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let server = TestServer::new(router(&stores, ImagePolicy::default())).unwrap();

        server
            .put(&format!("/api/district/{}", existing.id))
            .json(&json!({ "name": "Anonymous Edit" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&format!("/api/district/{}", existing.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let stored = stores.districts.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(stored.name, existing.name);
    }

    #[tokio::test]
    async fn test_update_bad_id_and_missing_district() {
        let stores = TestStores::default();
        let server = admin_server(&stores);

        server
            .put("/api/district/not-a-uuid")
            .json(&json!({ "name": "X" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .put(&format!("/api/district/{}", uuid::Uuid::new_v4()))
            .json(&json!({ "name": "X" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_json_update_round_trip_only_changes_name() {
        let stores = TestStores::default();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let server = admin_server(&stores);

        let response = server
            .put(&format!("/api/district/{}", existing.id))
            .json(&json!({ "name": "Jhargram" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Jhargram");
        assert_eq!(body["data"]["slug"], existing.slug.as_str());
        assert_eq!(body["data"]["area"], json!(existing.area));
        assert_eq!(body["data"]["population"], json!(existing.population));
        assert_eq!(body["data"]["gramPanchayats"], json!([]));
    }

    #[tokio::test]
    async fn test_multipart_update_uploads_header_and_parses_lists() {
        let stores = TestStores::default();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let server = admin_server(&stores);

        let form = MultipartForm::new()
            .add_text("majorRivers", "Subarnarekha, Dulung")
            .add_text(
                "famousPersonalities",
                r#"[{"name":"Raja Rammohan Roy","field":"Reform"}]"#,
            )
            .add_text("status", "active")
            .add_part(
                "headerImage",
                Part::bytes(png_bytes())
                    .file_name("header.png")
                    .mime_type("image/png"),
            );

        let response = server
            .put(&format!("/api/district/{}", existing.id))
            .multipart(form)
            .await;

        response.assert_status_ok();
        let stored = stores.districts.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(stored.major_rivers, vec!["Subarnarekha", "Dulung"]);
        assert_eq!(stored.famous_personalities.len(), 1);
        assert_eq!(stored.status, DistrictStatus::Active);
        assert_eq!(stored.area, existing.area);
        assert_eq!(stores.images.uploads().len(), 1);
        assert!(stored
            .header_image
            .unwrap()
            .starts_with(crate::shared::test_helpers::RecordingImageStore::BASE_URL));
    }

    #[tokio::test]
    async fn test_disallowed_or_oversized_file_rejected_before_upload() {
        let stores = TestStores::default();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();

        let server = admin_server(&stores);
        let pdf = MultipartForm::new().add_part(
            "headerImage",
            Part::bytes(b"%PDF-1.7\n".to_vec())
                .file_name("header.jpg")
                .mime_type("image/jpeg"),
        );
        server
            .put(&format!("/api/district/{}", existing.id))
            .multipart(pdf)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let small_limit =
            TestServer::new(with_admin_auth(router(&stores, ImagePolicy::new(8)))).unwrap();
        let png = MultipartForm::new().add_part(
            "headerImage",
            Part::bytes(png_bytes())
                .file_name("header.png")
                .mime_type("image/png"),
        );
        small_limit
            .put(&format!("/api/district/{}", existing.id))
            .multipart(png)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert!(stores.images.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_slug_conflict_returns_409() {
        let stores = TestStores::default();
        let taken = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let existing = stores.districts.insert(&fake_district_fields()).await.unwrap();
        let server = admin_server(&stores);

        let response = server
            .put(&format!("/api/district/{}", existing.id))
            .json(&json!({ "slug": taken.slug }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        let stored = stores.districts.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(stored.slug, existing.slug);
    }

    #[tokio::test]
    async fn test_url_method_update_replaces_hosted_image() {
        let stores = TestStores::default();
        let mut fields = fake_district_fields();
        fields.header_image = Some(stores.images.hosted_url("districts/previous"));
        let existing = stores.districts.insert(&fields).await.unwrap();
        let server = admin_server(&stores);

        let form = MultipartForm::new()
            .add_text("uploadMethod", "url")
            .add_text("headerImageUrl", "https://example.org/new-header.webp");

        server
            .put(&format!("/api/district/{}", existing.id))
            .multipart(form)
            .await
            .assert_status_ok();

        let stored = stores.districts.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(
            stored.header_image.as_deref(),
            Some("https://example.org/new-header.webp")
        );
        assert_eq!(stores.images.destroyed(), vec!["districts/previous"]);
        assert!(stores.images.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_create_multipart_returns_201() {
        let stores = TestStores::default();
        let server = admin_server(&stores);

        let form = MultipartForm::new()
            .add_text("name", "Alipurduar")
            .add_text("formationYear", "2014")
            .add_text("coordinates[lat]", "26.49")
            .add_text("coordinates[lng]", "89.52")
            .add_text("naturalSpots", "Buxa Tiger Reserve, Jayanti");

        let response = server.post("/api/districts").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["slug"], "alipurduar");
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["coordinates"]["lat"], 26.49);
        assert_eq!(stores.districts.all().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_cascade() {
        let stores = TestStores::default();
        let district = stores.districts.insert(&fake_district_fields()).await.unwrap();
        for _ in 0..2 {
            stores
                .gram_panchayats
                .insert(&fake_gram_panchayat_fields(district.id), "seed")
                .await
                .unwrap();
        }
        let server = admin_server(&stores);

        let response = server
            .delete(&format!("/api/district/{}", district.id))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["gramPanchayatsDeleted"], 2);
        assert_eq!(body["data"]["districtName"], district.name.as_str());
        assert!(stores
            .gram_panchayats
            .list_by_district(district.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_public_reads() {
        let stores = TestStores::default();
        let mut fields = fake_district_fields();
        fields.status = DistrictStatus::Active;
        let district = stores.districts.insert(&fields).await.unwrap();
        let server = TestServer::new(router(&stores, ImagePolicy::default())).unwrap();

        let list: Value = server.get("/api/districts").await.json();
        assert_eq!(list["meta"]["total"], 1);

        let by_slug = server
            .get(&format!("/api/districts/slug/{}", district.slug))
            .await;
        by_slug.assert_status_ok();

        let map: Value = server.get("/api/districts/map").await.json();
        assert_eq!(map["data"][0]["slug"], district.slug.as_str());
        assert_eq!(map["data"][0]["gramPanchayatCount"], 0);

        server
            .get("/api/districts/slug/nowhere")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
