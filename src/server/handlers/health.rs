use crate::platform::Platform;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::json;

/// Health check with basic process info
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "cache_store": state.config.cache_store.as_str(),
        "platforms": Platform::ALL.iter().map(|p| p.key_prefix()).collect::<Vec<_>>(),
    }))
}

/// Prometheus metrics snapshot
pub async fn metrics_snapshot() -> String {
    crate::metrics::render()
}
