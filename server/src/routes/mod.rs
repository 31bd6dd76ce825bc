//! API routes for the leafcure server

pub mod diagnose;
pub mod health;
pub mod remedy;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::SharedState;

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/catalog", get(remedy::list_catalog))
        .route("/remedy", post(remedy::resolve_remedy))
        .route("/diagnose", post(diagnose::diagnose_image))
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub mod testing {
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use image::{ImageFormat, Rgb, RgbImage};
    use leafcure::model::scaffold_artifact;
    use leafcure::LeafClassifierConfig;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::state::{AppState, ServerConfig};

    /// Router over a temp directory, with a small untrained artifact in it
    /// when `with_model` is set
    pub fn test_app(with_model: bool) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("tomato.json");

        if with_model {
            let labels = [
                "Tomato___Bacterial_spot",
                "Tomato___Early_blight",
                "Tomato___Late_blight",
                "Tomato___healthy",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect();
            let network = LeafClassifierConfig::new()
                .with_base_filters(4)
                .with_num_blocks(2)
                .with_hidden_units(8);
            scaffold_artifact(labels, &model_path, network, 32, None).unwrap();
        }

        let config = ServerConfig {
            model_path,
            ..ServerConfig::default()
        };
        let app = super::router(Arc::new(AppState::new(config)));
        (app, dir)
    }

    pub fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::from_fn(48, 48, |x, y| Rgb([(x * 5) as u8, 140, (y * 5) as u8]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        send(app, request).await
    }

    pub async fn post_bytes(app: Router, uri: &str, bytes: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        send(app, request).await
    }
}
