//! SQLite-backed group storage.
//!
//! The roster rows and the denormalized `current_students` counter are two
//! storage locations for one fact, so every membership mutation here runs
//! both writes inside a single transaction, with the counter moved by
//! SQL-side arithmetic rather than read-modify-write.

use chrono::{DateTime, Utc};

use crate::domain::models::{Group, Student};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct GroupRepository {
    db: DbConnection,
}

impl GroupRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, group: &Group) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO groups (
                id, group_name, group_description, is_active, current_students,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&group.id)
        .bind(&group.group_name)
        .bind(&group.group_description)
        .bind(group.is_active)
        .bind(group.current_students)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    /// Name uniqueness only applies among active groups; a soft-deleted
    /// group releases its name.
    pub async fn active_name_exists(
        &self,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM groups WHERE group_name = ? AND is_active = 1 AND id <> ?",
        )
        .bind(name)
        .bind(exclude_id.unwrap_or(""))
        .fetch_one(self.db.pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn list_active(&self) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT * FROM groups WHERE is_active = 1 ORDER BY created_at DESC",
        )
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn update_group(
        &self,
        id: &str,
        group_name: &str,
        group_description: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE groups SET group_name = ?, group_description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(group_name)
        .bind(group_description)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE groups SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Apply a membership diff for one student in a single transaction:
    /// join every group in `add`, leave every group in `remove`, moving the
    /// affected counters alongside. Set semantics — a membership that
    /// already exists (or is already gone) is skipped and its counter left
    /// alone. Returns (joined, left).
    ///
    /// Running both sides in one transaction is what keeps a class transfer
    /// from ever being observed half-applied.
    pub async fn sync_membership(
        &self,
        student_id: &str,
        add: &[String],
        remove: &[String],
        now: DateTime<Utc>,
    ) -> Result<(u64, u64), sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;
        let mut joined = 0;
        let mut left = 0;

        for group_id in add {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO enrollments (student_id, group_id, enrolled_at) VALUES (?, ?, ?)",
            )
            .bind(student_id)
            .bind(group_id)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 1 {
                sqlx::query(
                    "UPDATE groups SET current_students = current_students + 1, updated_at = ? WHERE id = ?",
                )
                .bind(now)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
                joined += 1;
            }
        }

        for group_id in remove {
            let removed = sqlx::query(
                "DELETE FROM enrollments WHERE student_id = ? AND group_id = ?",
            )
            .bind(student_id)
            .bind(group_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if removed == 1 {
                sqlx::query(
                    "UPDATE groups SET current_students = current_students - 1, updated_at = ? WHERE id = ?",
                )
                .bind(now)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
                left += 1;
            }
        }

        tx.commit().await?;
        Ok((joined, left))
    }

    /// Add the student to each group. Returns the number actually joined.
    pub async fn attach_student(
        &self,
        student_id: &str,
        group_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let (joined, _) = self.sync_membership(student_id, group_ids, &[], now).await?;
        Ok(joined)
    }

    /// Remove the student from each group. Returns the number actually left.
    pub async fn detach_student(
        &self,
        student_id: &str,
        group_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let (_, left) = self.sync_membership(student_id, &[], group_ids, now).await?;
        Ok(left)
    }

    pub async fn group_ids_of(&self, student_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT group_id FROM enrollments WHERE student_id = ? ORDER BY enrolled_at, group_id",
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn groups_of(&self, student_id: &str) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT g.* FROM groups g
            JOIN enrollments e ON e.group_id = g.id
            WHERE e.student_id = ?
            ORDER BY e.enrolled_at, g.group_name
            "#,
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn roster_of(&self, group_id: &str) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT s.* FROM students s
            JOIN enrollments e ON e.student_id = s.id
            WHERE e.group_id = ?
            ORDER BY s.student_name
            "#,
        )
        .bind(group_id)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn enrollment_count(&self, group_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(self.db.pool())
            .await
    }

    /// Consistency repair: recompute every counter from the enrollment
    /// table. Returns the number of groups whose counter was wrong.
    pub async fn recount_all(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE groups
            SET current_students = (
                    SELECT COUNT(*) FROM enrollments e WHERE e.group_id = groups.id
                ),
                updated_at = ?
            WHERE current_students <> (
                    SELECT COUNT(*) FROM enrollments e WHERE e.group_id = groups.id
                )
            "#,
        )
        .bind(now)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
