use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{contains_pattern, DbPool, RepoError};
use crate::diseases::models::{Disease, DiseaseFilter, NewDisease, PlantType};
use crate::schema::diseases;

/// Read access to the disease catalog, plus seeding.
#[async_trait]
pub trait DiseaseRepository: Send + Sync {
    /// Active rows matching the filter, ordered by name.
    async fn list_active(&self, filter: &DiseaseFilter) -> Result<Vec<Disease>, RepoError>;

    /// An active row by id. Inactive rows are treated as missing.
    async fn find_active(&self, id: Uuid) -> Result<Option<Disease>, RepoError>;

    /// Rows by id regardless of `is_active`, for attaching to predictions.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Disease>, RepoError>;

    /// First active row of `plant_type` whose name contains `fragment`, ignoring case.
    async fn find_match(
        &self,
        plant_type: PlantType,
        fragment: &str,
    ) -> Result<Option<Disease>, RepoError>;

    async fn create(&self, disease: NewDisease) -> Result<Disease, RepoError>;

    /// Inserts `rows` when the catalog is empty. Returns how many were inserted.
    async fn seed(&self, rows: Vec<NewDisease>) -> Result<usize, RepoError>;
}

pub struct PgDiseaseRepository {
    pool: DbPool,
}

impl PgDiseaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// Active rows of `plant_type` whose name contains `fragment`, first by name
fn match_query<'a>(plant_type: PlantType, fragment: &str) -> diseases::BoxedQuery<'a, Pg> {
    diseases::table
        .filter(diseases::plant_type.eq(plant_type))
        .filter(diseases::is_active.eq(true))
        .filter(diseases::name.ilike(contains_pattern(fragment)))
        .order((diseases::name.asc(), diseases::id.asc()))
        .into_boxed()
}

#[async_trait]
impl DiseaseRepository for PgDiseaseRepository {
    async fn list_active(&self, filter: &DiseaseFilter) -> Result<Vec<Disease>, RepoError> {
        let mut conn = self.pool.get().await?;

        let mut query = diseases::table
            .filter(diseases::is_active.eq(true))
            .select(Disease::as_select())
            .into_boxed();

        if let Some(plant_type) = filter.plant_type {
            query = query.filter(diseases::plant_type.eq(plant_type));
        }
        if let Some(search) = filter.search.as_deref() {
            query = query.filter(diseases::name.ilike(contains_pattern(search)));
        }

        Ok(query
            .order((diseases::name.asc(), diseases::id.asc()))
            .load(&mut conn)
            .await?)
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Disease>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(diseases::table
            .filter(diseases::id.eq(id))
            .filter(diseases::is_active.eq(true))
            .select(Disease::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Disease>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        Ok(diseases::table
            .filter(diseases::id.eq_any(ids.to_vec()))
            .select(Disease::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn find_match(
        &self,
        plant_type: PlantType,
        fragment: &str,
    ) -> Result<Option<Disease>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(match_query(plant_type, fragment)
            .first::<Disease>(&mut conn)
            .await
            .optional()?)
    }

    async fn create(&self, disease: NewDisease) -> Result<Disease, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(diseases::table)
            .values(&disease)
            .returning(Disease::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn seed(&self, rows: Vec<NewDisease>) -> Result<usize, RepoError> {
        let mut conn = self.pool.get().await?;

        let existing: i64 = diseases::table.count().get_result(&mut conn).await?;
        if existing > 0 {
            return Ok(0);
        }

        Ok(diesel::insert_into(diseases::table)
            .values(&rows)
            .execute(&mut conn)
            .await?)
    }
}

#[derive(Default)]
pub struct InMemoryDiseaseRepository {
    diseases: RwLock<Vec<Disease>>,
}

impl InMemoryDiseaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl DiseaseRepository for InMemoryDiseaseRepository {
    async fn list_active(&self, filter: &DiseaseFilter) -> Result<Vec<Disease>, RepoError> {
        let diseases = self.diseases.read().await;

        let mut rows: Vec<Disease> = diseases
            .iter()
            .filter(|d| d.is_active)
            .filter(|d| filter.plant_type.map_or(true, |p| d.plant_type == p))
            .filter(|d| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |s| contains_ignore_case(&d.name, s))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Disease>, RepoError> {
        let diseases = self.diseases.read().await;
        Ok(diseases.iter().find(|d| d.id == id && d.is_active).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Disease>, RepoError> {
        let diseases = self.diseases.read().await;
        Ok(diseases.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
    }

    async fn find_match(
        &self,
        plant_type: PlantType,
        fragment: &str,
    ) -> Result<Option<Disease>, RepoError> {
        let diseases = self.diseases.read().await;
        Ok(diseases
            .iter()
            .filter(|d| d.is_active && d.plant_type == plant_type)
            .filter(|d| contains_ignore_case(&d.name, fragment))
            .min_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn create(&self, disease: NewDisease) -> Result<Disease, RepoError> {
        let mut diseases = self.diseases.write().await;

        let now = Utc::now().naive_utc();
        let row = Disease {
            id: Uuid::new_v4(),
            name: disease.name,
            scientific_name: disease.scientific_name,
            plant_type: disease.plant_type,
            description: disease.description,
            symptoms: disease.symptoms,
            treatment: disease.treatment,
            prevention: disease.prevention,
            severity: disease.severity,
            is_active: disease.is_active,
            created_at: now,
            updated_at: now,
        };
        diseases.push(row.clone());
        Ok(row)
    }

    async fn seed(&self, rows: Vec<NewDisease>) -> Result<usize, RepoError> {
        if !self.diseases.read().await.is_empty() {
            return Ok(0);
        }

        let count = rows.len();
        for row in rows {
            self.create(row).await?;
        }
        Ok(count)
    }
}
