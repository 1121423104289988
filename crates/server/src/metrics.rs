use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static LISTING_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "marketplace_listing_requests_total",
        "Listing requests by entity and pagination mode",
        &["entity", "mode"]
    )
    .expect("register listing_requests_total")
});

pub static NEARBY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "marketplace_nearby_requests_total",
        "Proximity searches by strategy",
        &["strategy"]
    )
    .expect("register nearby_requests_total")
});

pub static NEARBY_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "marketplace_nearby_results",
        "Records returned per proximity search",
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]
    )
    .expect("register nearby_results")
});

pub static REQUEST_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "marketplace_request_errors_total",
        "Failed requests by service error code",
        &["code"]
    )
    .expect("register request_errors_total")
});

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    match String::from_utf8(buffer) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics utf8 error: {e}")),
    }
}
