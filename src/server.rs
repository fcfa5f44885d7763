use crate::api;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Liveness only; never touches storage.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Public content routes under `/api/`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(api::about::routes("/api/about"))
        .merge(api::about::routes("/api/About"))
        .merge(api::header::routes("/api/header"))
        .merge(api::header::routes("/api/Header"))
        .merge(api::news::routes("/api/news"))
        .merge(api::layout::routes("/api/layout"))
        .merge(api::home::routes("/api/home"))
        .merge(api::locations::routes("/api/locations"))
        .merge(api::products::routes("/api"))
        .merge(api::user_support::routes("/api/user-support"))
        .merge(api::service::routes("/api"))
        .merge(api::guidance::routes("/api/financial-guidance"))
}

/// Builds the whole application.
pub fn create_app(state: AppState) -> Router {
    let media = Router::new()
        .nest_service("/media", ServeDir::new(&state.config.media.root))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(MEDIA_CACHE_CONTROL),
                ))
                .layer(CorsLayer::permissive()),
        );

    let app = api_routes()
        .merge(api::admin::routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(&state)),
        )
        .with_state(state);

    // Health checks sit outside every layer
    Router::new()
        .route("/health", get(health))
        .route("/health/", get(health))
        .route("/healthcheck", get(health))
        .route("/healthcheck/", get(health))
        .merge(media)
        .merge(app)
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {addr}: {e}")))?;

    info!("Listening on {}", addr);
    println!("🚀 ASOMAP CMS running on http://{}", addr);
    println!("💚 Health check: http://{}/health/", addr);
    println!("🔐 Admin API:    http://{}/admin/api/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Server(e.to_string()))?;
    Ok(())
}
