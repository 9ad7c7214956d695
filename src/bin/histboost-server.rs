//! HTTP prediction server.
//!
//! Serves single-row predictions from native-JSON models stored in a
//! directory (`MODELS_DIR`, default `./models`). Models are loaded lazily
//! and cached behind a mutex.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use histboost::GradientBooster;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct AppState {
    models_dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<GradientBooster>>>,
}

impl AppState {
    fn new(models_dir: PathBuf) -> Self {
        AppState {
            models_dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a model by name, loading and caching it on first use.
    fn get_model(&self, name: &str) -> Result<Arc<GradientBooster>, String> {
        // Model names are plain file stems; reject anything path-like.
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_')) {
            return Err(format!("invalid model name: {}", name));
        }
        let mut cache = self.cache.lock().unwrap();
        if let Some(model) = cache.get(name) {
            return Ok(model.clone());
        }
        let path = self.models_dir.join(format!("{}.json", name));
        let model = GradientBooster::load_booster(&path).map_err(|e| e.to_string())?;
        let model = Arc::new(model);
        cache.insert(name.to_string(), model.clone());
        Ok(model)
    }

    fn list_models(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&self.models_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[derive(Deserialize)]
struct PredictRequest {
    model: String,
    /// One value per training feature; `null` marks a missing cell.
    features: Vec<Option<f32>>,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "models": state.list_models() }))
}

async fn predict(State(state): State<Arc<AppState>>, Json(req): Json<PredictRequest>) -> impl IntoResponse {
    let model = match state.get_model(&req.model) {
        Ok(model) => model,
        Err(message) => {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": message })));
        }
    };
    let row: Vec<f32> = req.features.iter().map(|v| v.unwrap_or(f32::NAN)).collect();
    let required = model.n_required_features();
    if row.len() < required {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("expected at least {} features, got {}", required, row.len()) })),
        );
    }
    match model.predict_row(&row) {
        Ok(prediction) => (StatusCode::OK, Json(json!({ "prediction": prediction }))),
        Err(e) => {
            error!("prediction failed: {}", e);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
    }
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/predict", post(predict))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let models_dir = std::env::var("MODELS_DIR").unwrap_or_else(|_| "./models".to_string());
    let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("API_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);

    let state = Arc::new(AppState::new(PathBuf::from(models_dir)));
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    info!("serving on http://{}", addr);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: unable to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
