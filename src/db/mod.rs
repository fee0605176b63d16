use diesel_async::pooled_connection::deadpool::{Pool, PoolError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use thiserror::Error;

// Type alias for our async PostgreSQL connection pool
pub type DbPool = Pool<AsyncPgConnection>;

// Creates a connection pool from DATABASE_URL
// Pool pre-creates connections for fast reuse across requests
pub fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Ok(Pool::builder(config).build()?)
}

/// Errors shared by every repository implementation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error(transparent)]
    Query(#[from] diesel::result::Error),
}

impl From<PoolError> for RepoError {
    fn from(e: PoolError) -> Self {
        RepoError::Pool(e.to_string())
    }
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
