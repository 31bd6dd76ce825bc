//! Health check endpoint

use axum::{extract::State, Json};
use leafcure::utils::format_duration;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub uptime: String,
    pub version: String,
    pub backend: String,
    pub model_loaded: bool,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_seconds = state.uptime_seconds();
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds,
        uptime: format_duration(uptime_seconds as f64),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: leafcure::backend::backend_name().to_string(),
        model_loaded: state.model.is_loaded(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::routes::testing::{get, test_app};

    #[tokio::test]
    async fn test_health_reports_lazy_model() {
        let (app, _dir) = test_app(false);

        let (status, body) = get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model_loaded"], false);
    }
}
