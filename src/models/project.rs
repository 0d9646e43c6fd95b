use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Completed,
}

/// A client's posted engagement. `assigned_to` is set exactly when some
/// proposal for the project has been accepted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Project {
    pub id: i32,
    pub client_id: i32,
    pub title: String,
    pub service: String,
    pub budget: BigDecimal,
    pub deadline: Option<NaiveDate>,
    pub details: Option<String>,
    pub status: ProjectStatus,
    pub assigned_to: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub service: String,
    pub budget: BigDecimal,
    pub deadline: Option<NaiveDate>,
    pub details: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("project title must not be empty".into()));
        }
        if self.service.trim().is_empty() {
            return Err(Error::Validation("project service must not be empty".into()));
        }
        if self.budget <= BigDecimal::from(0) {
            return Err(Error::Validation("project budget must be positive".into()));
        }
        Ok(())
    }
}
