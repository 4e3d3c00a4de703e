use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain model representing an instructional group.
///
/// `current_students` is a denormalized live counter maintained by the
/// enrollment synchronizer; after any synchronizer operation completes it
/// equals the number of enrollment rows pointing at this group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: String,
    pub group_name: String,
    pub group_description: String,
    /// Soft-delete flag. Groups are never hard-deleted; historical
    /// attendance keeps referencing them.
    pub is_active: bool,
    pub current_students: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Generate a unique ID for a group
    pub fn generate_id() -> String {
        format!("group::{}", Uuid::new_v4())
    }
}
