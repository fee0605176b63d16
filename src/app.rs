use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_routes, AuthUser, JwtConfig, UserRepository};
use crate::config::Config;
use crate::diseases::{disease_routes, DiseaseRepository};
use crate::error::{ApiError, ApiResult};
use crate::ml::{MlService, ModelInfo};
use crate::predictions::{prediction_routes, PredictionRepository};
use crate::response::DataResponse;
use crate::storage::PublicDisk;

/// Shared handles every handler receives.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: JwtConfig,
    pub users: Arc<dyn UserRepository>,
    pub diseases: Arc<dyn DiseaseRepository>,
    pub predictions: Arc<dyn PredictionRepository>,
    pub ml: Arc<dyn MlService>,
    pub storage: Arc<PublicDisk>,
}

pub fn router(state: AppState) -> Router {
    // Configure CORS to allow frontend connections
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/predictions", prediction_routes())
        .nest("/diseases", disease_routes())
        .route("/ml/model-info", get(model_info));

    let public_disk = ServeDir::new(state.storage.root());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .nest_service("/storage", public_disk)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// Liveness plus a probe of the ML service
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ml_service": state.ml.is_healthy().await,
    }))
}

// GET /ml/model-info
async fn model_info(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<DataResponse<ModelInfo>>> {
    let info = state.ml.model_info().await.map_err(ApiError::MlUnavailable)?;
    Ok(Json(DataResponse::new(info)))
}
