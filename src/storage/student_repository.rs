//! SQLite-backed student storage, including the payment flag/history pair.

use chrono::{DateTime, Utc};

use crate::domain::models::{PaymentRecord, Student};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct StudentRepository {
    db: DbConnection,
}

impl StudentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, student: &Student) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO students (
                id, student_code, student_name, student_phone, parent_phone,
                school_name, monthly_payment_paid, monthly_payment_date,
                monthly_payment_paid_by, is_blocked, block_reason, blocked_by,
                blocked_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.student_code)
        .bind(&student.student_name)
        .bind(&student.student_phone)
        .bind(&student.parent_phone)
        .bind(&student.school_name)
        .bind(student.monthly_payment_paid)
        .bind(student.monthly_payment_date)
        .bind(&student.monthly_payment_paid_by)
        .bind(student.is_blocked)
        .bind(&student.block_reason)
        .bind(&student.blocked_by)
        .bind(student.blocked_at)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    /// Exact lookup for numeric search terms. A term can in principle match
    /// one student's code and another student's phone; the code match wins.
    pub async fn find_by_code_or_phone(&self, term: &str) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE student_code = ? OR student_phone = ?
            ORDER BY CASE WHEN student_code = ? THEN 0 ELSE 1 END
            LIMIT 1
            "#,
        )
        .bind(term)
        .bind(term)
        .bind(term)
        .fetch_optional(self.db.pool())
        .await
    }

    /// Case-insensitive substring match on the student name, code-ordered so
    /// results are deterministic.
    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE lower(student_name) LIKE '%' || lower(?) || '%'
            ORDER BY student_code
            "#,
        )
        .bind(fragment)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY student_name")
            .fetch_all(self.db.pool())
            .await
    }

    pub async fn phone_exists(
        &self,
        phone: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM students WHERE student_phone = ? AND id <> ?",
        )
        .bind(phone)
        .bind(exclude_id.unwrap_or(""))
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE student_code = ?")
            .bind(code)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count > 0)
    }

    /// Update the editable profile fields. Returns the affected row count so
    /// the caller can distinguish a missing student.
    pub async fn update_profile(
        &self,
        id: &str,
        student_name: &str,
        student_phone: &str,
        parent_phone: &str,
        school_name: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET student_name = ?, student_phone = ?, parent_phone = ?,
                school_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(student_name)
        .bind(student_phone)
        .bind(parent_phone)
        .bind(school_name)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_block(
        &self,
        id: &str,
        reason: &str,
        blocked_by: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET is_blocked = 1, block_reason = ?, blocked_by = ?, blocked_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(reason)
        .bind(blocked_by)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear_block(&self, id: &str, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET is_blocked = 0, block_reason = '', blocked_by = NULL,
                blocked_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Set the paid flag and append the audit row in one transaction, so the
    /// flag can never be observed ahead of its history entry.
    pub async fn record_payment(&self, record: &PaymentRecord) -> Result<(), sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE students
            SET monthly_payment_paid = 1, monthly_payment_date = ?,
                monthly_payment_paid_by = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.paid_at)
        .bind(&record.paid_by)
        .bind(record.paid_at)
        .bind(&record.student_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payment_history (id, student_id, paid_at, paid_by, amount)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.student_id)
        .bind(record.paid_at)
        .bind(&record.paid_by)
        .bind(record.amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Clear the monthly flag for every student who still carries one.
    /// History rows are untouched. Returns the number of students changed,
    /// which makes a repeated run report zero.
    pub async fn reset_all_payments(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE students
            SET monthly_payment_paid = 0, monthly_payment_date = NULL,
                monthly_payment_paid_by = NULL, updated_at = ?
            WHERE monthly_payment_paid <> 0
               OR monthly_payment_date IS NOT NULL
               OR monthly_payment_paid_by IS NOT NULL
            "#,
        )
        .bind(now)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Payment history for one student, oldest first.
    pub async fn payment_history(
        &self,
        student_id: &str,
    ) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payment_history WHERE student_id = ? ORDER BY paid_at",
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await
    }

    /// Hard-delete the student row and its billing state. Enrollments must
    /// already be detached; attendance entries keep their soft reference.
    pub async fn delete(&self, id: &str) -> Result<u64, sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM payment_history WHERE student_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
