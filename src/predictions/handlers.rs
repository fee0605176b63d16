use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{PathParam, QueryParams};
use crate::predictions::models::{PageQuery, Prediction, PredictionResource};
use crate::predictions::service::{create_prediction, read_form, to_resources};
use crate::response::{DataResponse, MessageResponse, PageMeta, PaginatedResponse};
use crate::AppState;

// GET /predictions?page=&per_page=
pub async fn index(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<PageQuery>,
) -> ApiResult<Json<PaginatedResponse<PredictionResource>>> {
    let (page, per_page) = query.resolve(state.config.per_page);

    let (rows, total) = state
        .predictions
        .list_for_user(auth.user.id, page, per_page)
        .await?;

    Ok(Json(PaginatedResponse {
        data: to_resources(&state, rows).await?,
        meta: PageMeta::new(page, per_page, total),
    }))
}

// POST /predictions (multipart: image, plant_type)
pub async fn store(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<PredictionResource>>)> {
    let form = read_form(multipart?).await?;

    let resource = create_prediction(&state, auth.user.id, &form).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            resource,
            "Prediction completed successfully",
        )),
    ))
}

// GET /predictions/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<DataResponse<PredictionResource>>> {
    let prediction = owned_prediction(&state, id, &auth).await?;

    let resource = to_resources(&state, vec![prediction])
        .await?
        .pop()
        .ok_or(ApiError::NotFound("Prediction"))?;

    Ok(Json(DataResponse::new(resource)))
}

// DELETE /predictions/{id}
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let prediction = owned_prediction(&state, id, &auth).await?;

    state
        .storage
        .delete(&prediction.image_path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    state.predictions.delete(prediction.id).await?;

    info!(prediction_id = %prediction.id, user_id = %auth.user.id, "Prediction deleted");

    Ok(Json(MessageResponse {
        message: "Prediction deleted successfully",
    }))
}

// Helper: load a prediction and make sure the caller owns it
async fn owned_prediction(state: &AppState, id: Uuid, auth: &AuthUser) -> ApiResult<Prediction> {
    let prediction = state
        .predictions
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("Prediction"))?;

    if prediction.user_id != auth.user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(prediction)
}
