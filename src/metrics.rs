//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("aviary_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");

    // Application Metrics
    pub static ref ACCOUNTS_TOTAL: IntGauge = IntGauge::new(
        "aviary_accounts_total",
        "Total number of registered accounts"
    ).expect("metric can be created");
    pub static ref FOLLOW_EDGES_TOTAL: IntGauge = IntGauge::new(
        "aviary_follow_edges_total",
        "Total number of follow relationships"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("aviary_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACCOUNTS_TOTAL.clone()))
        .expect("ACCOUNTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOW_EDGES_TOTAL.clone()))
        .expect("FOLLOW_EDGES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
