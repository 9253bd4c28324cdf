use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn root_handler() -> &'static str {
    "Hello from Acquisitions API!"
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

pub async fn api_handler() -> Json<Value> {
    Json(json!({ "message": "Acquisitions API is running!" }))
}
