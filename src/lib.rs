pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod diseases;
pub mod error;
pub mod extract;
pub mod ml;
pub mod predictions;
pub mod response;
pub mod schema;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::{router, AppState};
