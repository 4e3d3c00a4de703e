//! SQLite-backed attendance ledger storage.
//!
//! The per-day per-group sheet is created by an atomic upsert on its
//! (date, group) unique key, and the per-student entry insert is guarded by
//! the (sheet, student) primary key, so the first-arrival and duplicate
//! check-in races both resolve inside the database.

use chrono::{DateTime, Utc};

use crate::domain::models::{AttendanceEntry, AttendanceLogEntry, AttendanceSheet};
use crate::storage::connection::DbConnection;

/// Joined row backing one roster line; the service layers the running count
/// on top.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RosterRow {
    pub student_id: String,
    pub student_code: String,
    pub student_name: String,
    pub effective_paid: bool,
    pub marked_at: DateTime<Utc>,
    pub added_by: String,
    pub added_by_name: Option<String>,
}

#[derive(Clone)]
pub struct AttendanceRepository {
    db: DbConnection,
}

impl AttendanceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Fetch the sheet for (date, group), creating it if this is the first
    /// check-in of the day. Concurrent first arrivals race on the unique
    /// key and exactly one insert wins; everyone then reads the same row.
    pub async fn upsert_sheet(
        &self,
        date: &str,
        group_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSheet, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO attendance_sheets (id, date, group_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (date, group_id) DO NOTHING
            "#,
        )
        .bind(AttendanceSheet::generate_id())
        .bind(date)
        .bind(group_id)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        sqlx::query_as::<_, AttendanceSheet>(
            "SELECT * FROM attendance_sheets WHERE date = ? AND group_id = ?",
        )
        .bind(date)
        .bind(group_id)
        .fetch_one(self.db.pool())
        .await
    }

    pub async fn find_sheet(
        &self,
        date: &str,
        group_id: &str,
    ) -> Result<Option<AttendanceSheet>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceSheet>(
            "SELECT * FROM attendance_sheets WHERE date = ? AND group_id = ?",
        )
        .bind(date)
        .bind(group_id)
        .fetch_optional(self.db.pool())
        .await
    }

    /// Append a presence mark. Returns false when the student already has an
    /// entry on this sheet — the ledger is left untouched in that case.
    pub async fn insert_entry(&self, entry: &AttendanceEntry) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO attendance_entries (sheet_id, student_id, added_by, marked_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&entry.sheet_id)
        .bind(&entry.student_id)
        .bind(&entry.added_by)
        .bind(entry.marked_at)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Remove the student's mark from the (date, group) sheet. Returns false
    /// when no such mark exists.
    pub async fn remove_entry(
        &self,
        date: &str,
        group_id: &str,
        student_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM attendance_entries
            WHERE student_id = ?
              AND sheet_id IN (
                  SELECT id FROM attendance_sheets WHERE date = ? AND group_id = ?
              )
            "#,
        )
        .bind(student_id)
        .bind(date)
        .bind(group_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Roster lines for one (date, group) sheet, in check-in order. Entries
    /// whose student has since been hard-deleted are filtered by the join.
    pub async fn roster_rows(
        &self,
        date: &str,
        group_id: &str,
    ) -> Result<Vec<RosterRow>, sqlx::Error> {
        sqlx::query_as::<_, RosterRow>(
            r#"
            SELECT
                st.id AS student_id,
                st.student_code,
                st.student_name,
                -- same derivation as PaymentStatus::derive
                CASE WHEN st.monthly_payment_paid <> 0
                       OR EXISTS (SELECT 1 FROM payment_history ph WHERE ph.student_id = st.id)
                     THEN 1 ELSE 0 END AS effective_paid,
                e.marked_at,
                e.added_by,
                emp.employee_name AS added_by_name
            FROM attendance_entries e
            JOIN attendance_sheets s ON s.id = e.sheet_id
            JOIN students st ON st.id = e.student_id
            LEFT JOIN employees emp ON emp.id = e.added_by
            WHERE s.date = ? AND s.group_id = ?
            ORDER BY e.marked_at
            "#,
        )
        .bind(date)
        .bind(group_id)
        .fetch_all(self.db.pool())
        .await
    }

    /// How many sheets for this group carry the student — the running visit
    /// count shown beside each roster line.
    pub async fn sheet_count_for(
        &self,
        student_id: &str,
        group_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM attendance_entries e
            JOIN attendance_sheets s ON s.id = e.sheet_id
            WHERE e.student_id = ? AND s.group_id = ?
            "#,
        )
        .bind(student_id)
        .bind(group_id)
        .fetch_one(self.db.pool())
        .await
    }

    /// The student's attendance log across all groups, newest first.
    pub async fn log_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<AttendanceLogEntry>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceLogEntry>(
            r#"
            SELECT s.date, s.group_id, g.group_name, e.marked_at
            FROM attendance_entries e
            JOIN attendance_sheets s ON s.id = e.sheet_id
            JOIN groups g ON g.id = s.group_id
            WHERE e.student_id = ?
            ORDER BY s.date DESC, e.marked_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn sheet_exists(&self, date: &str, group_id: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_sheets WHERE date = ? AND group_id = ?",
        )
        .bind(date)
        .bind(group_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }
}
