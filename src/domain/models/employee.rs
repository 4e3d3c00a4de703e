use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff member used purely as an attribution reference (`added_by`,
/// `paid_by`, `blocked_by`). Authentication happens outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: String,
    pub employee_name: String,
    pub phone: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Generate a unique ID for an employee
    pub fn generate_id() -> String {
        format!("employee::{}", Uuid::new_v4())
    }
}
