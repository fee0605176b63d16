use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{DbPool, RepoError};
use crate::predictions::models::{page_offset, NewPrediction, Prediction};
use crate::schema::predictions;

/// Storage for prediction rows. Rows are never updated once created.
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    async fn create(&self, prediction: NewPrediction) -> Result<Prediction, RepoError>;

    /// One page (1-based) of a user's predictions, newest first, with the total row count.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Prediction>, i64), RepoError>;

    async fn find(&self, id: Uuid) -> Result<Option<Prediction>, RepoError>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

pub struct PgPredictionRepository {
    pool: DbPool,
}

impl PgPredictionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// One page of a user's rows, newest first; ties fall back to id
fn page_query<'a>(user_id: Uuid, page: i64, per_page: i64) -> predictions::BoxedQuery<'a, Pg> {
    predictions::table
        .filter(predictions::user_id.eq(user_id))
        .order((predictions::created_at.desc(), predictions::id.desc()))
        .limit(per_page)
        .offset(page_offset(page, per_page))
        .into_boxed()
}

#[async_trait]
impl PredictionRepository for PgPredictionRepository {
    async fn create(&self, prediction: NewPrediction) -> Result<Prediction, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(predictions::table)
            .values(&prediction)
            .returning(Prediction::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Prediction>, i64), RepoError> {
        let mut conn = self.pool.get().await?;

        let total: i64 = predictions::table
            .filter(predictions::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await?;

        let rows = page_query(user_id, page, per_page)
            .load::<Prediction>(&mut conn)
            .await?;

        Ok((rows, total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Prediction>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(predictions::table
            .filter(predictions::id.eq(id))
            .select(Prediction::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel::delete(predictions::table.filter(predictions::id.eq(id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}

#[derive(Default)]
pub struct InMemoryPredictionRepository {
    // id -> (insertion sequence, row); the sequence breaks created_at ties
    predictions: RwLock<HashMap<Uuid, (u64, Prediction)>>,
    next_seq: RwLock<u64>,
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.predictions.read().await.len()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    async fn create(&self, prediction: NewPrediction) -> Result<Prediction, RepoError> {
        let mut seq = self.next_seq.write().await;
        let mut predictions = self.predictions.write().await;

        let now = Utc::now().naive_utc();
        let row = Prediction {
            id: Uuid::new_v4(),
            user_id: prediction.user_id,
            image_path: prediction.image_path,
            predicted_class: prediction.predicted_class,
            confidence: prediction.confidence,
            plant_type: prediction.plant_type,
            disease_id: prediction.disease_id,
            all_predictions: prediction.all_predictions,
            inference_time: prediction.inference_time,
            created_at: now,
            updated_at: now,
        };
        *seq += 1;
        predictions.insert(row.id, (*seq, row.clone()));
        Ok(row)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Prediction>, i64), RepoError> {
        let predictions = self.predictions.read().await;

        let mut owned: Vec<&(u64, Prediction)> = predictions
            .values()
            .filter(|(_, p)| p.user_id == user_id)
            .collect();
        owned.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));

        let total = owned.len() as i64;
        let skip = usize::try_from(page_offset(page, per_page)).unwrap_or(usize::MAX);
        let rows = owned
            .into_iter()
            .skip(skip)
            .take(per_page.max(0) as usize)
            .map(|(_, p)| p.clone())
            .collect();

        Ok((rows, total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Prediction>, RepoError> {
        let predictions = self.predictions.read().await;
        Ok(predictions.get(&id).map(|(_, p)| p.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut predictions = self.predictions.write().await;
        Ok(predictions.remove(&id).is_some())
    }
}
