use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::{login, logout, refresh, register, user};
use crate::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/user", get(user))
}
