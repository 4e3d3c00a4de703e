use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::student::Student;

/// One recorded monthly payment. Rows are append-only; the monthly reset
/// clears the flag on the student but never this log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: String,
    pub student_id: String,
    pub paid_at: DateTime<Utc>,
    pub paid_by: String,
    pub amount: f64,
}

impl PaymentRecord {
    /// Generate a unique ID for a payment record
    pub fn generate_id() -> String {
        format!("payment::{}", Uuid::new_v4())
    }
}

/// The most recent payment, wherever it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPayment {
    pub date: DateTime<Utc>,
    pub paid_by: Option<String>,
    pub amount: Option<f64>,
}

/// Derived payment view of a student.
///
/// The explicit paid flag and the history log can legitimately disagree
/// (the flag is cleared every month, the log is permanent), so every read
/// site derives the effective status through this one function instead of
/// reading the flag directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    /// True when the explicit flag is set OR the history is non-empty.
    pub effective_paid: bool,
    /// True when this student has paid for the current period.
    pub paid_this_period: bool,
    pub last_payment: Option<LastPayment>,
}

impl PaymentStatus {
    /// Derive the payment view from the student row and its (ascending)
    /// payment history.
    pub fn derive(student: &Student, history: &[PaymentRecord]) -> PaymentStatus {
        let effective_paid = student.monthly_payment_paid || !history.is_empty();

        let last_payment = history
            .last()
            .map(|record| LastPayment {
                date: record.paid_at,
                paid_by: Some(record.paid_by.clone()),
                amount: Some(record.amount),
            })
            .or_else(|| {
                // Flag set by hand with no history row (legacy data path)
                match (student.monthly_payment_paid, student.monthly_payment_date) {
                    (true, Some(date)) => Some(LastPayment {
                        date,
                        paid_by: student.monthly_payment_paid_by.clone(),
                        amount: None,
                    }),
                    _ => None,
                }
            });

        PaymentStatus {
            effective_paid,
            paid_this_period: student.monthly_payment_paid,
            last_payment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bare_student() -> Student {
        let now = Utc::now();
        Student {
            id: Student::generate_id(),
            student_code: "4821".into(),
            student_name: "Test Student".into(),
            student_phone: "01000000001".into(),
            parent_phone: "01000000002".into(),
            school_name: "".into(),
            monthly_payment_paid: false,
            monthly_payment_date: None,
            monthly_payment_paid_by: None,
            is_blocked: false,
            block_reason: "".into(),
            blocked_by: None,
            blocked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unpaid_without_flag_or_history() {
        let status = PaymentStatus::derive(&bare_student(), &[]);
        assert!(!status.effective_paid);
        assert!(status.last_payment.is_none());
    }

    #[test]
    fn history_alone_reports_paid() {
        let student = bare_student();
        let record = PaymentRecord {
            id: PaymentRecord::generate_id(),
            student_id: student.id.clone(),
            paid_at: Utc::now(),
            paid_by: "emp-1".into(),
            amount: 150.0,
        };
        // Flag cleared by the monthly reset, history kept
        let status = PaymentStatus::derive(&student, &[record.clone()]);
        assert!(status.effective_paid);
        assert!(!status.paid_this_period);
        let last = status.last_payment.expect("last payment");
        assert_eq!(last.paid_by.as_deref(), Some("emp-1"));
        assert_eq!(last.amount, Some(150.0));
    }

    #[test]
    fn flag_alone_reports_paid_with_flag_date() {
        let mut student = bare_student();
        let paid_at = Utc::now();
        student.monthly_payment_paid = true;
        student.monthly_payment_date = Some(paid_at);
        student.monthly_payment_paid_by = Some("emp-2".into());

        let status = PaymentStatus::derive(&student, &[]);
        assert!(status.effective_paid);
        assert!(status.paid_this_period);
        let last = status.last_payment.expect("last payment");
        assert_eq!(last.date, paid_at);
        assert_eq!(last.paid_by.as_deref(), Some("emp-2"));
        assert_eq!(last.amount, None);
    }

    #[test]
    fn last_history_entry_wins_over_flag_date() {
        let mut student = bare_student();
        student.monthly_payment_paid = true;
        student.monthly_payment_date = Some(Utc::now());
        let older = PaymentRecord {
            id: PaymentRecord::generate_id(),
            student_id: student.id.clone(),
            paid_at: Utc::now() - chrono::Duration::days(40),
            paid_by: "emp-1".into(),
            amount: 100.0,
        };
        let newer = PaymentRecord {
            id: PaymentRecord::generate_id(),
            student_id: student.id.clone(),
            paid_at: Utc::now(),
            paid_by: "emp-3".into(),
            amount: 150.0,
        };
        let status = PaymentStatus::derive(&student, &[older, newer]);
        assert_eq!(
            status.last_payment.expect("last payment").paid_by.as_deref(),
            Some("emp-3")
        );
    }
}
