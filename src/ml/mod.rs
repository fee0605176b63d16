pub mod client;
pub mod models;

pub use client::{HttpMlService, MlError, MlService};
pub use models::{ClassPrediction, ImageUpload, MlHealth, MlPrediction, ModelInfo};
