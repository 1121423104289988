use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

use configs::{DiscoveryConfig, PaginationConfig};
use server::{routes, state::ServerState};
use service::source::SeaOrmTechnicianGeoSource;
use service::Marketplace;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn app_over(db: DatabaseConnection) -> Router {
    let marketplace = Marketplace::new(
        db.clone(),
        SeaOrmTechnicianGeoSource::new(db, false),
        PaginationConfig::default(),
        DiscoveryConfig::default(),
    );
    routes::build_router(ServerState::new(marketplace), cors())
}

/// Router over a disconnected store. Touching it panics, so these requests
/// must be rejected by validation before any I/O.
fn app() -> Router { app_over(DatabaseConnection::Disconnected) }

async fn get(uri: &str) -> (StatusCode, Value) { get_from(app(), uri).await }

async fn get_from(app: Router, uri: &str) -> (StatusCode, Value) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_are_exposed() {
    let res = app()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_cursor_is_bad_request() {
    let (status, body) = get("/api/users?cursor=not-a-cursor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2002);
    assert_eq!(body["error"], "Invalid Cursor");
}

#[tokio::test]
async fn zero_or_oversized_limit_is_bad_request() {
    for uri in ["/api/technicians?limit=0", "/api/service-categories?limit=1000", "/api/reviews/offset?take=-5"] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], 2003, "{uri}");
    }
}

#[tokio::test]
async fn negative_skip_is_bad_request() {
    let (status, body) = get("/api/services/offset?skip=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2003);
}

#[tokio::test]
async fn out_of_range_coordinate_is_bad_request() {
    let (status, body) = get("/api/technicians/nearby?lat=95&lng=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2001);
}

#[tokio::test]
async fn non_positive_radius_is_bad_request() {
    let (status, body) = get("/api/technicians/nearby?lat=6.5&lng=3.3&radius_km=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2004);
}

#[tokio::test]
async fn unknown_availability_is_bad_request() {
    let (status, _) = get("/api/technicians?availability=sleeping").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    // one failure each for the page fetch and the count
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([
            DbErr::Custom("connection reset".into()),
            DbErr::Custom("connection reset".into()),
        ])
        .into_connection();
    let (status, body) = get_from(app_over(db), "/api/users").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 2101);
    assert_eq!(body["error"], "Data Source Unavailable");
    assert!(body["detail"].as_str().is_some_and(|d| d.contains("connection reset")), "{body}");
}

#[tokio::test]
async fn bookmarks_of_unknown_user_are_not_found() {
    // empty bookmark page, zero count, no such user
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<models::bookmark::Model>::new(), Vec::new(), Vec::new()])
        .into_connection();
    let uri = format!("/api/users/{}/bookmarks", uuid::Uuid::new_v4());
    let (status, body) = get_from(app_over(db), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 2005);
}
