use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// One entry of the per-class score list returned by the ML service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub class_name: String,
    pub confidence: f64,
}

// POST /predict response
#[derive(Debug, Clone, Deserialize)]
pub struct MlPrediction {
    pub predicted_class: String,
    pub confidence: f64,
    #[serde(default)]
    pub all_predictions: Vec<ClassPrediction>,
    #[serde(default)]
    pub inference_time: Option<f64>,
}

// GET /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlHealth {
    pub status: String,
    pub model_loaded: bool,
    #[serde(default)]
    pub version: Option<String>,
}

// GET /model-info response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub model_version: String,
    #[serde(default)]
    pub num_classes: usize,
    pub classes: Vec<String>,
    pub input_shape: Vec<u32>,
}

/// An image accepted from a client, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}
