pub mod catalog;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;

pub use models::{Disease, PlantType, Severity};
pub use repository::{DiseaseRepository, InMemoryDiseaseRepository, PgDiseaseRepository};
pub use routes::disease_routes;
