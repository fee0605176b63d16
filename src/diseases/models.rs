use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::schema::diseases;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Plants the classifier knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum PlantType {
    Tomato,
    Potato,
}

impl PlantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlantType::Tomato => "tomato",
            PlantType::Potato => "potato",
        }
    }
}

impl fmt::Display for PlantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlantType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tomato" => Ok(PlantType::Tomato),
            "potato" => Ok(PlantType::Potato),
            other => Err(UnknownVariant {
                kind: "plant type",
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Pg> for PlantType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for PlantType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(UnknownVariant {
                kind: "severity",
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Pg> for Severity {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for Severity {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

// Disease - catalog row with the static treatment text
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = diseases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Disease {
    pub id: Uuid,
    pub name: String,
    pub scientific_name: Option<String>,
    pub plant_type: PlantType,
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
    pub prevention: String,
    pub severity: Severity,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = diseases)]
pub struct NewDisease {
    pub name: String,
    pub scientific_name: Option<String>,
    pub plant_type: PlantType,
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
    pub prevention: String,
    pub severity: Severity,
    pub is_active: bool,
}

/// Query for `GET /diseases`. Only active rows are ever listed.
#[derive(Debug, Clone, Default)]
pub struct DiseaseFilter {
    pub plant_type: Option<PlantType>,
    pub search: Option<String>,
}

// Raw query string, validated into a `DiseaseFilter` by the handler
#[derive(Debug, Default, Deserialize)]
pub struct DiseaseQuery {
    pub plant_type: Option<String>,
    pub search: Option<String>,
}
