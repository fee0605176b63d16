use std::collections::HashMap;

use axum::{extract::multipart::MultipartError, extract::Multipart, http::StatusCode};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::MAX_UPLOAD_BYTES;
use crate::db::RepoError;
use crate::diseases::{Disease, PlantType};
use crate::error::{ApiError, ValidationErrors};
use crate::ml::{ImageUpload, MlError};
use crate::predictions::classify::{disease_name_for_class, plant_type_for_class};
use crate::predictions::models::{ClassScores, NewPrediction, Prediction, PredictionResource};
use crate::storage::StorageError;
use crate::AppState;

/// Directory on the public disk holding uploaded leaf images.
pub const PREDICTIONS_DIR: &str = "predictions";

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Ml(#[from] MlError),
    #[error("failed to store image: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to save prediction: {0}")]
    Repo(#[from] RepoError),
}

impl PredictionError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictionError::Ml(MlError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::Ml(_) => StatusCode::BAD_GATEWAY,
            PredictionError::Storage(_) | PredictionError::Repo(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// A validated `POST /predictions` body.
#[derive(Debug)]
pub struct PredictionForm {
    pub image: ImageUpload,
    pub extension: &'static str,
    /// Client hint, accepted but not used: the label decides the plant type.
    pub plant_type: Option<PlantType>,
}

/// File extension for JPEG or PNG content, judged by magic bytes.
pub fn sniff_image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(JPEG_MAGIC) {
        Some("jpg")
    } else if bytes.starts_with(PNG_MAGIC) {
        Some("png")
    } else {
        None
    }
}

/// Reads and validates the multipart body. Nothing is written anywhere.
pub async fn read_form(mut multipart: Multipart) -> Result<PredictionForm, ApiError> {
    let mut image: Option<ImageUpload> = None;
    let mut plant_type_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("plant_type") => {
                plant_type_raw = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let mut errors = ValidationErrors::new();

    let mut extension = None;
    match &image {
        None => errors.add("image", "The image field is required."),
        Some(upload) if upload.bytes.is_empty() => {
            errors.add("image", "The image field is required.")
        }
        Some(upload) => {
            extension = sniff_image_extension(&upload.bytes);
            if !ALLOWED_MIME_TYPES.contains(&upload.content_type.as_str()) || extension.is_none() {
                errors.add("image", "The image must be a file of type: jpeg, jpg, png.");
            }
            if upload.bytes.len() > MAX_UPLOAD_BYTES {
                errors.add("image", "The image may not be greater than 10240 kilobytes.");
            }
        }
    }

    let plant_type = match plant_type_raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<PlantType>() {
            Ok(plant_type) => Some(plant_type),
            Err(_) => {
                errors.add("plant_type", "The selected plant type is invalid.");
                None
            }
        },
    };

    errors.check()?;

    match (image, extension) {
        (Some(image), Some(extension)) => Ok(PredictionForm {
            image,
            extension,
            plant_type,
        }),
        _ => Err(ValidationErrors::single("image", "The image field is required.")),
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationErrors::single("image", "The image may not be greater than 10240 kilobytes.")
    } else {
        ValidationErrors::single("image", format!("The image failed to upload: {}", e.body_text()))
    }
}

/// Stores the image, classifies it and records the prediction.
///
/// Any failure after the image is written removes it again, and no row is
/// created in that case.
pub async fn create_prediction(
    state: &AppState,
    user_id: Uuid,
    form: &PredictionForm,
) -> Result<PredictionResource, PredictionError> {
    let image_path = state
        .storage
        .put(PREDICTIONS_DIR, form.extension, &form.image.bytes)
        .await?;

    match classify_and_record(state, user_id, &form.image, &image_path).await {
        Ok(resource) => Ok(resource),
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&image_path).await {
                warn!(image_path = %image_path, "Failed to remove image after error: {}", cleanup);
            }
            error!(user_id = %user_id, error = %e, "Prediction failed");
            Err(e)
        }
    }
}

async fn classify_and_record(
    state: &AppState,
    user_id: Uuid,
    image: &ImageUpload,
    image_path: &str,
) -> Result<PredictionResource, PredictionError> {
    let result = state.ml.predict(image).await?;

    let plant_type = plant_type_for_class(&result.predicted_class);
    let disease = match disease_name_for_class(&result.predicted_class) {
        Some(name) => state.diseases.find_match(plant_type, &name).await?,
        None => None,
    };

    let prediction = state
        .predictions
        .create(NewPrediction {
            user_id,
            image_path: image_path.to_string(),
            predicted_class: result.predicted_class,
            confidence: result.confidence,
            plant_type,
            disease_id: disease.as_ref().map(|d| d.id),
            all_predictions: ClassScores(result.all_predictions),
            inference_time: result.inference_time,
        })
        .await?;

    info!(
        prediction_id = %prediction.id,
        predicted_class = %prediction.predicted_class,
        confidence = prediction.confidence,
        "Prediction created successfully"
    );

    let image_url = state.storage.url(&prediction.image_path);
    Ok(PredictionResource::new(prediction, disease, image_url))
}

/// Attaches each prediction's disease (active or not) with one catalog lookup.
pub async fn to_resources(
    state: &AppState,
    predictions: Vec<Prediction>,
) -> Result<Vec<PredictionResource>, RepoError> {
    let mut ids: Vec<Uuid> = predictions.iter().filter_map(|p| p.disease_id).collect();
    ids.sort();
    ids.dedup();

    let diseases: HashMap<Uuid, Disease> = state
        .diseases
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    Ok(predictions
        .into_iter()
        .map(|p| {
            let disease = p.disease_id.and_then(|id| diseases.get(&id).cloned());
            let image_url = state.storage.url(&p.image_path);
            PredictionResource::new(p, disease, image_url)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_image_extension() {
        assert_eq!(sniff_image_extension(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some("jpg"));
        assert_eq!(
            sniff_image_extension(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR"),
            Some("png")
        );
        assert_eq!(sniff_image_extension(b"GIF89a"), None);
        assert_eq!(sniff_image_extension(b"%PDF-1.7"), None);
        assert_eq!(sniff_image_extension(&[]), None);
    }

    #[test]
    fn test_status_by_failure_kind() {
        let remote = PredictionError::Ml(MlError::Remote {
            status: 500,
            detail: "boom".to_string(),
        });
        assert_eq!(remote.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(remote.to_string(), "ML service error: boom");

        let invalid = PredictionError::Ml(MlError::InvalidResponse("x".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_GATEWAY);

        let repo = PredictionError::Repo(RepoError::Pool("down".to_string()));
        assert_eq!(repo.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
