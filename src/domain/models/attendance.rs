use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One per-day per-group ledger, created lazily on the first check-in of the
/// day and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSheet {
    pub id: String,
    /// Civil date key in the center's timezone, `YYYY-MM-DD`.
    pub date: String,
    pub group_id: String,
    pub created_at: DateTime<Utc>,
}

impl AttendanceSheet {
    /// Generate a unique ID for an attendance sheet
    pub fn generate_id() -> String {
        format!("sheet::{}", Uuid::new_v4())
    }
}

/// A single presence mark inside a sheet. At most one per student per sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceEntry {
    pub sheet_id: String,
    pub student_id: String,
    /// Attribution reference to the employee who recorded the mark.
    pub added_by: String,
    pub marked_at: DateTime<Utc>,
}

/// One line of a day roster as shown on the attendance screen: the present
/// student, who marked them, and their running visit count for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub student_code: String,
    pub student_name: String,
    /// Derived payment view (flag OR non-empty history), same rule as
    /// [`super::payment::PaymentStatus::derive`].
    pub effective_paid: bool,
    pub marked_at: DateTime<Utc>,
    pub added_by: String,
    pub added_by_name: Option<String>,
    pub attendance_count: i64,
}

/// One line of a student's attendance log, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceLogEntry {
    pub date: String,
    pub group_id: String,
    pub group_name: String,
    pub marked_at: DateTime<Utc>,
}
