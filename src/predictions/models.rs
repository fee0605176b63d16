use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diseases::{Disease, PlantType};
use crate::ml::ClassPrediction;
use crate::schema::predictions;

/// Per-class scores kept as a JSONB array, highest confidence first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
#[serde(transparent)]
pub struct ClassScores(pub Vec<ClassPrediction>);

impl FromSql<Jsonb, Pg> for ClassScores {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl ToSql<Jsonb, Pg> for ClassScores {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let value = serde_json::to_value(&self.0)?;
        <serde_json::Value as ToSql<Jsonb, Pg>>::to_sql(&value, &mut out.reborrow())
    }
}

// Prediction - one stored inference request
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = predictions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub plant_type: PlantType,
    pub disease_id: Option<Uuid>,
    pub all_predictions: ClassScores,
    pub inference_time: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = predictions)]
pub struct NewPrediction {
    pub user_id: Uuid,
    pub image_path: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub plant_type: PlantType,
    pub disease_id: Option<Uuid>,
    pub all_predictions: ClassScores,
    pub inference_time: Option<f64>,
}

/// A prediction as returned by the API, with its disease attached.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResource {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_path: String,
    pub image_url: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub plant_type: PlantType,
    pub disease_id: Option<Uuid>,
    pub disease: Option<Disease>,
    pub all_predictions: Vec<ClassPrediction>,
    pub inference_time: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PredictionResource {
    pub fn new(prediction: Prediction, disease: Option<Disease>, image_url: String) -> Self {
        Self {
            id: prediction.id,
            user_id: prediction.user_id,
            image_path: prediction.image_path,
            image_url,
            predicted_class: prediction.predicted_class,
            confidence: prediction.confidence,
            plant_type: prediction.plant_type,
            disease_id: prediction.disease_id,
            disease,
            all_predictions: prediction.all_predictions.0,
            inference_time: prediction.inference_time,
            created_at: prediction.created_at,
            updated_at: prediction.updated_at,
        }
    }
}

// GET /predictions query string
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Page number (from 1) and page size, clamped to sane bounds.
    pub fn resolve(&self, default_per_page: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        (page, per_page)
    }
}

/// Rows to skip before `page`. Saturates instead of overflowing on huge pages.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page.max(0))
}
