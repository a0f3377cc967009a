use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service status plus the generation worker counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let registry = state.tracker.registry();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "perspective-api",
        "generations": {
            "inFlight": registry.in_flight().await,
            "leaked": registry.leaked()
        }
    }))
}
