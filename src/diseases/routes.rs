use axum::{routing::get, Router};

use crate::diseases::handlers::{index, show};
use crate::AppState;

pub fn disease_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show))
}
