pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod models;
pub mod repository;
pub mod routes;

pub use extractor::AuthUser;
pub use handlers::*;
pub use jwt::JwtConfig;
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use routes::auth_routes;
