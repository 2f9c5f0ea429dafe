mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::routes as auth_routes;
use crate::features::auth::{AuthService, JwtService};
use crate::features::choices::routes as choices_routes;
use crate::features::incident_files::{routes as incident_files_routes, IncidentFileService};
use crate::features::incidents::{routes as incidents_routes, IncidentService};
use crate::features::offenses::{routes as offenses_routes, OffenseService};
use crate::features::officers::{routes as officers_routes, OfficerService};
use crate::features::parties::{routes as parties_routes, PartyService};
use crate::modules::storage::{FileStorage, LocalStorage};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn_with_state, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

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
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

/// Everything the API routes need, built once at startup
struct AppServices {
    jwt: Arc<JwtService>,
    auth: Arc<AuthService>,
    officers: Arc<OfficerService>,
    offenses: Arc<OffenseService>,
    incidents: Arc<IncidentService>,
    parties: Arc<PartyService>,
    files: Arc<IncidentFileService>,
}

impl AppServices {
    fn new(pool: PgPool, jwt: Arc<JwtService>, storage: Arc<dyn FileStorage>, max_upload_size: usize) -> Self {
        Self {
            auth: Arc::new(AuthService::new(pool.clone(), Arc::clone(&jwt))),
            officers: Arc::new(OfficerService::new(pool.clone())),
            offenses: Arc::new(OffenseService::new(pool.clone())),
            incidents: Arc::new(IncidentService::new(pool.clone(), Arc::clone(&storage))),
            parties: Arc::new(PartyService::new(pool.clone())),
            files: Arc::new(IncidentFileService::new(pool, storage, max_upload_size)),
            jwt,
        }
    }
}

/// API and health routes; swagger and the outer layers are added by the caller
fn api_router(services: AppServices, max_upload_size: usize) -> Router {
    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&services.auth)))
        .merge(officers_routes::routes(services.officers))
        .merge(offenses_routes::routes(services.offenses))
        .merge(incidents_routes::routes(services.incidents))
        .merge(parties_routes::routes(services.parties))
        .merge(
            incident_files_routes::routes(services.files)
                // Multipart bodies carry whole files
                .layer(DefaultBodyLimit::max(max_upload_size.saturating_add(64 * 1024))),
        )
        .route_layer(from_fn_with_state(
            Arc::clone(&services.jwt),
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(services.auth))
        .merge(choices_routes::routes());

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
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

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let jwt = Arc::new(JwtService::new(&config.auth));
    tracing::info!("JWT service initialized (issuer: {})", config.auth.issuer);

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to create media root {}: {}",
                config.media.root.display(),
                e
            )
        })?;
    let storage: Arc<dyn FileStorage> = Arc::new(LocalStorage::new(config.media.root.clone()));
    tracing::info!("File storage rooted at {}", config.media.root.display());

    let services = AppServices::new(pool, jwt, storage, config.media.max_upload_size);
    tracing::info!("Services initialized");

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
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    let app = Router::new()
        .merge(swagger)
        .merge(api_router(services, config.media.max_upload_size))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{bearer_header, test_auth_config};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    struct TestApp {
        server: TestServer,
        token: String,
        media: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        app_with_pool(database::lazy_pool())
    }

    fn app_with_pool(pool: PgPool) -> TestApp {
        let media = tempfile::tempdir().unwrap();
        let jwt = Arc::new(JwtService::new(&test_auth_config()));
        let token = bearer_header(&jwt)
            .trim_start_matches("Bearer ")
            .to_string();
        let storage: Arc<dyn FileStorage> = Arc::new(LocalStorage::new(media.path()));
        let services = AppServices::new(pool, jwt, storage, 1024 * 1024);

        TestApp {
            server: TestServer::new(api_router(services, 1024 * 1024)).unwrap(),
            token,
            media,
        }
    }

    #[tokio::test]
    async fn test_health_and_choices_are_public() {
        let app = test_app();
        app.server.get("/health").await.assert_status_ok();

        let response = app.server.get("/api/choices").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["shift"][0]["value"], "D");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let app = test_app();
        for path in ["/api/incidents", "/api/officers", "/api/incidents/1/victims", "/api/auth/me"] {
            app.server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        app.server
            .get("/api/incidents")
            .authorization_bearer("not-a-jwt")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_put_is_not_routed() {
        let app = test_app();
        for path in [
            "/api/incidents/1",
            "/api/officers/1",
            "/api/offenses/1",
            "/api/incidents/1/suspects/1",
        ] {
            app.server
                .put(path)
                .authorization_bearer(&app.token)
                .json(&json!({}))
                .await
                .assert_status(StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_rejected_before_the_database() {
        let app = test_app();

        app.server
            .post("/api/incidents")
            .authorization_bearer(&app.token)
            .json(&json!({}))
            .await
            .assert_status_bad_request();

        app.server
            .patch("/api/incidents/1")
            .authorization_bearer(&app.token)
            .json(&json!({ "beat": -1 }))
            .await
            .assert_status_bad_request();

        app.server
            .patch("/api/incidents/1")
            .authorization_bearer(&app.token)
            .json(&json!({ "incident_number": "has spaces" }))
            .await
            .assert_status_bad_request();

        app.server
            .get("/api/incidents/search")
            .add_query_param("beat", "twelve")
            .authorization_bearer(&app.token)
            .await
            .assert_status_bad_request();

        app.server
            .post("/api/auth/token")
            .json(&json!({ "username": "jdoe" }))
            .await
            .assert_status_bad_request();
    }

    /// Two officers (ids 1 and 2, user 1 matching the test token) and two offenses
    async fn seed(pool: &PgPool) {
        sqlx::raw_sql(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name)
            VALUES ('jdoe', 'x', 'Jane', 'Doe'), ('rroe', 'x', 'Rick', 'Roe');
            INSERT INTO officers (user_id, officer_number) VALUES (1, 101), (2, 102);
            INSERT INTO offenses (gcic_code, ucr_code, ucr_name_classification)
            VALUES ('16-7-1', '0500', 'Burglary'), ('16-8-2', '0600', 'Theft');
            "#,
        )
        .execute(pool)
        .await
        .unwrap();
    }

    fn incident_body(number: &str) -> serde_json::Value {
        json!({
            "incident_number": number,
            "report_datetime": "2024-03-01 14:30",
            "reporting_officer": 1,
            "reviewed_by_officer": 2,
            "investigating_officer": 1,
            "officer_making_report": 1,
            "supervisor": {"id": 2},
            "earliest_occurrence_datetime": "2024-02-29 23:00",
            "latest_occurrence_datetime": "2024-03-01 01:00",
            "beat": 12,
            "shift": "N",
            "offenses": [1, 2],
            "victims": [
                {"first_name": "Pat", "last_name": "Doe"},
                {"first_name": "Sam", "last_name": "Roe"}
            ]
        })
    }

    async fn create_incident(app: &TestApp, number: &str) -> i64 {
        let response = app
            .server
            .post("/api/incidents")
            .authorization_bearer(&app.token)
            .json(&incident_body(number))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["data"]["id"].as_i64().unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_incident_create_conflict_and_delete(pool: PgPool) {
        seed(&pool).await;
        let app = app_with_pool(pool);

        let id = create_incident(&app, "2024-001").await;

        let response = app
            .server
            .post("/api/incidents")
            .authorization_bearer(&app.token)
            .json(&incident_body("2024-001"))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let detail: serde_json::Value = app
            .server
            .get(&format!("/api/incidents/{}", id))
            .authorization_bearer(&app.token)
            .await
            .json();
        assert_eq!(detail["data"]["offenses"].as_array().unwrap().len(), 2);
        assert_eq!(detail["data"]["victims"][1]["display_sequence"], 1);

        app.server
            .delete(&format!("/api/incidents/{}", id))
            .authorization_bearer(&app.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.server
            .get(&format!("/api/incidents/{}", id))
            .authorization_bearer(&app.token)
            .await
            .assert_status_not_found();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_new_victim_is_numbered_after_existing(pool: PgPool) {
        seed(&pool).await;
        let app = app_with_pool(pool);
        let id = create_incident(&app, "2024-002").await;

        let response = app
            .server
            .post(&format!("/api/incidents/{}/victims", id))
            .authorization_bearer(&app.token)
            .json(&json!({"first_name": "Lee", "last_name": "Poe"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["display_sequence"], 2);
        assert_eq!(body["data"]["party_type"], "VICTIM");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_victim_filters_must_match_one_victim(pool: PgPool) {
        seed(&pool).await;
        let app = app_with_pool(pool);
        create_incident(&app, "2024-003").await;

        let search = |first: &'static str, last: &'static str| {
            app.server
                .get("/api/incidents/search")
                .add_query_param("victim_first_name", first)
                .add_query_param("victim_last_name", last)
                .authorization_bearer(&app.token)
        };

        let mixed: serde_json::Value = search("Pat", "Roe").await.json();
        assert_eq!(mixed["meta"]["total"], 0);
        assert!(mixed["data"].as_array().unwrap().is_empty());

        let same: serde_json::Value = search("Pat", "Doe").await.json();
        assert_eq!(same["meta"]["total"], 1);
        assert_eq!(same["data"][0]["incident_number"], "2024-003");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_incident_form_keeps_every_offense(pool: PgPool) {
        seed(&pool).await;
        let app = app_with_pool(pool);
        let id = create_incident(&app, "2024-004").await;

        let body: serde_json::Value = app
            .server
            .get(&format!("/api/incidents/{}/form", id))
            .authorization_bearer(&app.token)
            .await
            .json();
        assert_eq!(body["data"]["offenses"], "1,2");
        assert_eq!(body["data"]["victims-TOTAL_FORMS"], "2");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_renumbered_incident_keeps_its_files(pool: PgPool) {
        use axum_test::multipart::{MultipartForm, Part};

        seed(&pool).await;
        let app = app_with_pool(pool);
        let id = create_incident(&app, "2024-005").await;

        let form = MultipartForm::new().add_part(
            "files",
            Part::bytes(b"photo".as_slice())
                .file_name("scene.jpg")
                .mime_type("image/jpeg"),
        );
        let response = app
            .server
            .post(&format!("/api/incidents/{}/files", id))
            .authorization_bearer(&app.token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        let file_id = body["data"][0]["id"].as_i64().unwrap();

        app.server
            .patch(&format!("/api/incidents/{}", id))
            .authorization_bearer(&app.token)
            .json(&json!({"incident_number": "2024-005A"}))
            .await
            .assert_status_ok();
        assert!(!app.media.path().join("2024-005").exists());
        assert!(app.media.path().join("2024-005A/scene.jpg").exists());

        // A new incident takes the old number; deleting it leaves the renamed files alone
        let reused = create_incident(&app, "2024-005").await;
        app.server
            .delete(&format!("/api/incidents/{}", reused))
            .authorization_bearer(&app.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let download = app
            .server
            .get(&format!("/api/incidents/{}/files/{}/download", id, file_id))
            .authorization_bearer(&app.token)
            .await;
        download.assert_status_ok();
        assert_eq!(download.as_bytes().as_ref(), &b"photo"[..]);

        app.server
            .delete(&format!("/api/incidents/{}", id))
            .authorization_bearer(&app.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(!app.media.path().join("2024-005A").exists());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires DATABASE_URL pointing at a Postgres server"]
    async fn test_failed_upload_keeps_nothing(pool: PgPool) {
        use axum_test::multipart::{MultipartForm, Part};

        seed(&pool).await;
        let app = app_with_pool(pool);
        let id = create_incident(&app, "2024-006").await;

        // The second name is longer than the filesystem allows
        let form = MultipartForm::new()
            .add_part("files", Part::bytes(b"ok".as_slice()).file_name("ok.txt"))
            .add_part(
                "files",
                Part::bytes(b"too long".as_slice()).file_name(format!("{}.txt", "a".repeat(300))),
            );
        let response = app
            .server
            .post(&format!("/api/incidents/{}/files", id))
            .authorization_bearer(&app.token)
            .multipart(form)
            .expect_failure()
            .await;
        assert!(response.status_code().is_server_error());
        assert!(!app.media.path().join("2024-006/ok.txt").exists());

        let listed: serde_json::Value = app
            .server
            .get(&format!("/api/incidents/{}/files", id))
            .authorization_bearer(&app.token)
            .await
            .json();
        assert!(listed["data"].as_array().unwrap().is_empty());
    }
}
