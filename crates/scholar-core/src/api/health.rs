//! Liveness check

/// `GET /health`
pub async fn health_handler() -> &'static str {
    "OK"
}
