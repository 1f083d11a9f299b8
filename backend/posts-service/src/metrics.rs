//! Prometheus metrics for posts-service.
//!
//! Collectors live in the default registry; `serve_metrics` renders them for
//! the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Feed assembly duration by scope (all, group, author, follow).
    pub static ref FEED_ASSEMBLY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_assembly_duration_seconds",
        "Time to assemble a feed segmented by scope",
        &["scope"]
    )
    .expect("failed to register feed_assembly_duration_seconds");

    /// Page cache events (hit/miss/invalidate).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "page_cache_events_total",
        "Page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register page_cache_events_total");

    /// Successful writes by entity and action.
    pub static ref CONTENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_writes_total",
        "Content writes segmented by entity and action",
        &["entity", "action"]
    )
    .expect("failed to register content_writes_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
