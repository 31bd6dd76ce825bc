//! Diagnosis endpoint - image bytes in, label, confidence and advice out

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use leafcure::{diagnosis, Diagnosis};
use tracing::{error, info, warn};

use crate::state::SharedState;

/// POST /diagnose - Classify the JPEG/PNG request body
///
/// 503 if the model cannot be loaded, 422 if the image cannot be used.
pub async fn diagnose_image(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Diagnosis>, (StatusCode, String)> {
    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Request body must contain a JPEG or PNG image".to_string(),
        ));
    }

    let handle = state.model.get_or_load().await.map_err(|e| {
        error!("Model unavailable: {}", e);
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    let size = body.len();
    let result = tokio::task::spawn_blocking(move || diagnosis::diagnose(&handle, &body))
        .await
        .map_err(|e| {
            error!("Inference task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Inference task failed".to_string(),
            )
        })?;

    match result {
        Ok(diagnosis) => {
            info!(
                "Diagnosed {} byte image as {} ({:.2}%)",
                size,
                diagnosis.raw_label,
                diagnosis.confidence * 100.0
            );
            Ok(Json(diagnosis))
        }
        Err(e) => {
            warn!("Rejected image: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::routes::testing::{get, png_bytes, post_bytes, test_app};

    #[tokio::test]
    async fn test_diagnose_png() {
        let (app, _dir) = test_app(true);

        let (status, body) = post_bytes(app.clone(), "/diagnose", png_bytes()).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["raw_label"].as_str().unwrap().starts_with("Tomato___"));
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        assert!(json["advisory"]["text"].is_string());

        let (_, health) = get(app, "/health").await;
        let health: Value = serde_json::from_slice(&health).unwrap();
        assert_eq!(health["model_loaded"], true);
    }

    #[tokio::test]
    async fn test_diagnose_is_repeatable() {
        let (app, _dir) = test_app(true);

        let (_, first) = post_bytes(app.clone(), "/diagnose", png_bytes()).await;
        let (_, second) = post_bytes(app, "/diagnose", png_bytes()).await;

        let first: Value = serde_json::from_slice(&first).unwrap();
        let second: Value = serde_json::from_slice(&second).unwrap();
        assert_eq!(first["raw_label"], second["raw_label"]);
        assert_eq!(first["confidence"], second["confidence"]);
    }

    #[tokio::test]
    async fn test_missing_model_is_service_unavailable() {
        let (app, _dir) = test_app(false);

        let (status, body) = post_bytes(app, "/diagnose", png_bytes()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(String::from_utf8_lossy(&body).contains("not found"));
    }

    #[tokio::test]
    async fn test_unusable_geometry_is_service_unavailable() {
        let (app, dir) = test_app(true);
        let manifest_path = dir.path().join("tomato.json");
        let mut manifest = leafcure::ModelManifest::load(&manifest_path).unwrap();
        manifest.input_size = 2;
        manifest.save(&manifest_path).unwrap();

        let (status, body) = post_bytes(app.clone(), "/diagnose", png_bytes()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(String::from_utf8_lossy(&body).contains("geometry"));

        let (_, health) = get(app, "/health").await;
        let health: Value = serde_json::from_slice(&health).unwrap();
        assert_eq!(health["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_malformed_image_is_unprocessable() {
        let (app, _dir) = test_app(true);

        let (status, _) = post_bytes(app, "/diagnose", b"not an image".to_vec()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        let (app, _dir) = test_app(true);

        let (status, _) = post_bytes(app, "/diagnose", Vec::new()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
