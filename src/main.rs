use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::{middleware::from_fn_with_state, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use district_atlas_core::core::config::Config;
use district_atlas_core::core::openapi::{ApiDoc, SwaggerInfoModifier};
use district_atlas_core::core::{database, middleware};
use district_atlas_core::features::auth;
use district_atlas_core::features::districts::repositories::PgDistrictRepository;
use district_atlas_core::features::districts::{routes as districts_routes, DistrictService};
use district_atlas_core::features::gram_panchayats::repositories::PgGramPanchayatRepository;
use district_atlas_core::features::gram_panchayats::{
    routes as gram_panchayats_routes, GramPanchayatService,
};
use district_atlas_core::modules::storage::{self, ImageManager, ImagePolicy};

/// Headroom on top of the image limit for the other multipart fields
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.issuer,
        config.auth.jwks_cache_ttl,
    ));
    let jwt_validator = Arc::new(auth::JwtValidator::new(jwks_client, &config.auth));
    tracing::info!("Auth configuration initialized");

    // Image storage
    let image_store = storage::connect(&config.image_store)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize image store: {}", e))?;
    let images = Arc::new(ImageManager::new(
        image_store,
        ImagePolicy::new(config.app.max_image_upload_bytes),
    ));
    tracing::info!(
        "Image store initialized ({:?}, max upload {} bytes)",
        config.image_store.provider,
        config.app.max_image_upload_bytes
    );

    // Catalogue services
    let district_repository = Arc::new(PgDistrictRepository::new(pool.clone()));
    let gram_panchayat_repository = Arc::new(PgGramPanchayatRepository::new(pool.clone()));

    let district_service = Arc::new(DistrictService::new(
        district_repository.clone(),
        gram_panchayat_repository.clone(),
        Arc::clone(&images),
    ));
    let gram_panchayat_service = Arc::new(GramPanchayatService::new(
        gram_panchayat_repository,
        district_repository,
        images,
    ));
    tracing::info!("Catalogue services initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::swagger_basic_auth,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Catalogue routes: reads are anonymous, mutations check `RequireAdmin`
    let catalogue_routes = Router::new()
        .merge(districts_routes::routes(district_service))
        .merge(gram_panchayats_routes::routes(gram_panchayat_service))
        .layer(DefaultBodyLimit::max(
            config.app.max_image_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .route_layer(from_fn_with_state(
            jwt_validator,
            middleware::auth_middleware,
        ));

    async fn health_check(State(pool): State<PgPool>) -> StatusCode {
        match database::ping(&pool).await {
            Ok(()) => StatusCode::OK,
            Err(e) => {
                tracing::error!("Health check failed: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
    let health_route = Router::new()
        .route("/health", axum::routing::get(health_check))
        .with_state(pool);

    let app = Router::new()
        .merge(swagger)
        .merge(catalogue_routes)
        .merge(health_route)
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors_layer(
                    config.app.cors_allowed_origins.clone(),
                )),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
