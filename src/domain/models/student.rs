use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::Group;
use super::payment::PaymentStatus;

/// Domain model representing an enrolled student.
///
/// Membership lives in the enrollment table, not on this struct; use
/// [`crate::domain::enrollment_service::EnrollmentService::groups_of`] or a
/// [`StudentProfile`] when the group references are needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: String,
    /// Short numeric code handed to the student (printed on their card and
    /// registered on the fingerprint device). Globally unique.
    pub student_code: String,
    pub student_name: String,
    /// Globally unique contact number.
    pub student_phone: String,
    pub parent_phone: String,
    pub school_name: String,
    pub monthly_payment_paid: bool,
    pub monthly_payment_date: Option<DateTime<Utc>>,
    pub monthly_payment_paid_by: Option<String>,
    pub is_blocked: bool,
    pub block_reason: String,
    pub blocked_by: Option<String>,
    pub blocked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Generate a unique ID for a student
    pub fn generate_id() -> String {
        format!("student::{}", Uuid::new_v4())
    }
}

/// A student together with its populated group references and the derived
/// payment view. This is what search, list and detail read paths return, so
/// payment status is computed in exactly one place for all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student: Student,
    pub groups: Vec<Group>,
    pub payment: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = Student::generate_id();
        let b = Student::generate_id();
        assert_ne!(a, b);
        assert!(a.starts_with("student::"));
    }
}
