pub mod listings;
pub mod technicians;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::metrics::encode_metrics;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

pub async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

/// Build the full application router: health, metrics, listings, discovery and docs
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/api/technicians", get(technicians::list))
        .route("/api/technicians/offset", get(technicians::list_offset))
        .route("/api/technicians/nearby", get(technicians::nearby))
        .route("/api/services", get(listings::services))
        .route("/api/services/offset", get(listings::services_offset))
        .route("/api/reviews", get(listings::reviews))
        .route("/api/reviews/offset", get(listings::reviews_offset))
        .route("/api/users", get(listings::users))
        .route("/api/users/offset", get(listings::users_offset))
        .route("/api/users/:user_id/bookmarks", get(listings::bookmarks))
        .route("/api/users/:user_id/bookmarks/offset", get(listings::bookmarks_offset))
        .route("/api/service-categories", get(listings::categories))
        .route("/api/service-categories/offset", get(listings::categories_offset))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
