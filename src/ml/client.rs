use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::MlConfig;
use crate::ml::models::{ImageUpload, MlHealth, MlPrediction, ModelInfo};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum MlError {
    #[error("ML service is unavailable. Please try again later.")]
    Unavailable(#[source] reqwest::Error),
    #[error("ML service error: {detail}")]
    Remote { status: u16, detail: String },
    #[error("invalid response from ML service: {0}")]
    InvalidResponse(String),
    #[error("failed to build ML service request: {0}")]
    Request(String),
}

impl MlError {
    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::Unavailable(_) => true,
            MlError::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Client for the external classification service.
#[async_trait]
pub trait MlService: Send + Sync {
    async fn predict(&self, image: &ImageUpload) -> Result<MlPrediction, MlError>;

    async fn health(&self) -> Result<MlHealth, MlError>;

    async fn model_info(&self) -> Result<ModelInfo, MlError>;

    /// Healthy means the service answers, reports "healthy" and has its model loaded.
    async fn is_healthy(&self) -> bool {
        match self.health().await {
            Ok(health) => health.status == "healthy" && health.model_loaded,
            Err(e) => {
                warn!("ML service health check failed: {}", e);
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpMlService {
    client: reqwest::Client,
    config: MlConfig,
}

impl HttpMlService {
    pub fn new(config: MlConfig) -> Result<Self, MlError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MlError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn with_retry<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, MlError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, MlError>> + Send,
        T: Send,
    {
        let attempts = self.config.retry_times.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    warn!(
                        "ML {} attempt {}/{} failed, retrying in {:?}: {}",
                        op, attempt, attempts, self.config.retry_sleep, e
                    );
                    tokio::time::sleep(self.config.retry_sleep).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_predict(&self, image: &ImageUpload) -> Result<MlPrediction, MlError> {
        let part = Part::stream(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| MlError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.config.endpoint(&self.config.predict_endpoint))
            .timeout(self.config.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(service_url = %self.config.service_url, "Failed to connect to ML service: {}", e);
                MlError::Unavailable(e)
            })?;

        let prediction: MlPrediction = decode(resp).await?;
        if prediction.predicted_class.is_empty() {
            return Err(MlError::InvalidResponse("empty predicted_class".to_string()));
        }
        if !(0.0..=1.0).contains(&prediction.confidence) {
            return Err(MlError::InvalidResponse(format!(
                "confidence {} outside 0..=1",
                prediction.confidence
            )));
        }
        Ok(prediction)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, MlError> {
        let resp = self
            .client
            .get(self.config.endpoint(endpoint))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(MlError::Unavailable)?;
        decode(resp).await
    }
}

#[async_trait]
impl MlService for HttpMlService {
    async fn predict(&self, image: &ImageUpload) -> Result<MlPrediction, MlError> {
        info!(
            service_url = %self.config.service_url,
            image_name = %image.file_name,
            image_size = image.bytes.len(),
            "Sending image to ML service for prediction"
        );

        let prediction = self
            .with_retry("predict", || self.send_predict(image))
            .await?;

        info!(
            predicted_class = %prediction.predicted_class,
            confidence = prediction.confidence,
            inference_time = prediction.inference_time.unwrap_or_default(),
            "Prediction received from ML service"
        );
        Ok(prediction)
    }

    async fn health(&self) -> Result<MlHealth, MlError> {
        self.get_json(&self.config.health_endpoint).await
    }

    async fn model_info(&self) -> Result<ModelInfo, MlError> {
        self.with_retry("model-info", || self.get_json(&self.config.model_info_endpoint))
            .await
    }
}

// Turns a response into `T`, mapping non-2xx statuses to `MlError::Remote`
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, MlError> {
    let status = resp.status();
    let raw = resp.text().await.map_err(MlError::Unavailable)?;

    if !status.is_success() {
        error!(status = status.as_u16(), body = %raw, "ML service returned error");
        let detail = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| match v.get("detail") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(MlError::Remote {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_str(&raw)
        .map_err(|e| MlError::InvalidResponse(format!("json parse failed: {e}, raw={raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use axum::{extract::Multipart, http::StatusCode, routing::{get, post}, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(url: &str, retry_times: u32) -> MlConfig {
        let mut config = MlConfig::new(url);
        config.retry_times = retry_times;
        config.retry_sleep = Duration::from_millis(10);
        config.timeout = Duration::from_secs(5);
        config
    }

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: "leaf.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: axum::body::Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
        }
    }

    #[tokio::test]
    async fn test_predict_sends_file_part() {
        let app = Router::new().route(
            "/predict",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("file"));
                assert_eq!(field.file_name(), Some("leaf.png"));
                let bytes = field.bytes().await.unwrap();
                assert!(bytes.starts_with(b"\x89PNG"));
                Json(json!({
                    "predicted_class": "Tomato___Late_blight",
                    "confidence": 0.92,
                    "all_predictions": [{"class_name": "Tomato___Late_blight", "confidence": 0.92}],
                    "inference_time": 0.05
                }))
            }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 1)).unwrap();

        let prediction = ml.predict(&upload()).await.unwrap();
        assert_eq!(prediction.predicted_class, "Tomato___Late_blight");
        assert_eq!(prediction.all_predictions.len(), 1);
        assert_eq!(prediction.inference_time, Some(0.05));
    }

    #[tokio::test]
    async fn test_client_error_carries_detail_and_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/predict",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::BAD_REQUEST, Json(json!({"detail": "Invalid image"})))
                }
            }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 3)).unwrap();

        let err = ml.predict(&upload()).await.unwrap_err();
        match &err {
            MlError::Remote { status, detail } => {
                assert_eq!(*status, 400);
                assert_eq!(detail, "Invalid image");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "ML service error: Invalid image");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/predict",
            post(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "warming up"})))
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!({"predicted_class": "Potato___healthy", "confidence": 0.7})),
                        )
                    }
                }
            }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 2)).unwrap();

        let prediction = ml.predict(&upload()).await.unwrap();
        assert_eq!(prediction.predicted_class, "Potato___healthy");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remote_error_without_detail() {
        let app = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 1)).unwrap();

        let err = ml.predict(&upload()).await.unwrap_err();
        assert_eq!(err.to_string(), "ML service error: Unknown error");
    }

    #[tokio::test]
    async fn test_connection_failure_is_unavailable() {
        let url = closed_port_url().await;
        let ml = HttpMlService::new(config(&url, 2)).unwrap();

        let err = ml.predict(&upload()).await.unwrap_err();
        assert!(matches!(err, MlError::Unavailable(_)));
        assert_eq!(err.to_string(), "ML service is unavailable. Please try again later.");
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_invalid() {
        let app = Router::new().route(
            "/predict",
            post(|| async { Json(json!({"predicted_class": "Tomato___healthy", "confidence": 1.7})) }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 1)).unwrap();

        assert!(matches!(
            ml.predict(&upload()).await,
            Err(MlError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_health_and_model_info() {
        let app = Router::new()
            .route(
                "/health",
                get(|| async { Json(json!({"status": "healthy", "model_loaded": true, "version": "1.0.0"})) }),
            )
            .route(
                "/model-info",
                get(|| async {
                    Json(json!({
                        "model_name": "MobileNetV2",
                        "model_version": "20251027_200458",
                        "num_classes": 2,
                        "classes": ["Tomato___healthy", "Tomato___Late_blight"],
                        "input_shape": [224, 224, 3]
                    }))
                }),
            );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 1)).unwrap();

        assert!(ml.is_healthy().await);
        let info = ml.model_info().await.unwrap();
        assert_eq!(info.model_name, "MobileNetV2");
        assert_eq!(info.classes.len(), 2);
        assert_eq!(info.input_shape, vec![224, 224, 3]);
    }

    #[tokio::test]
    async fn test_degraded_service_is_unhealthy() {
        let app = Router::new().route(
            "/health",
            get(|| async { Json(json!({"status": "degraded", "model_loaded": false, "version": "1.0.0"})) }),
        );
        let url = spawn_server(app).await;
        let ml = HttpMlService::new(config(&url, 1)).unwrap();
        assert!(!ml.is_healthy().await);

        let down = HttpMlService::new(config(&closed_port_url().await, 1)).unwrap();
        assert!(!down.is_healthy().await);
    }
}
