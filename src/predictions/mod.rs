pub mod classify;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

pub use repository::{InMemoryPredictionRepository, PgPredictionRepository, PredictionRepository};
pub use routes::prediction_routes;
