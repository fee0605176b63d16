use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};

use crate::config::MAX_UPLOAD_BYTES;
use crate::predictions::handlers::{destroy, index, show, store};
use crate::AppState;

// Headroom above the image limit so oversize files reach validation
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn prediction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route("/{id}", get(show).delete(destroy))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
