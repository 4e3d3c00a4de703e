use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:attendance.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                student_code TEXT NOT NULL UNIQUE,
                student_name TEXT NOT NULL,
                student_phone TEXT NOT NULL UNIQUE,
                parent_phone TEXT NOT NULL,
                school_name TEXT NOT NULL DEFAULT '',
                monthly_payment_paid INTEGER NOT NULL DEFAULT 0,
                monthly_payment_date TEXT,
                monthly_payment_paid_by TEXT,
                is_blocked INTEGER NOT NULL DEFAULT 0,
                block_reason TEXT NOT NULL DEFAULT '',
                blocked_by TEXT,
                blocked_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                group_name TEXT NOT NULL,
                group_description TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                current_students INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // One row per (student, group) membership. This table is both sides
        // of the relationship: a student's group set and a group's roster
        // are the two query directions over it.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS enrollments (
                student_id TEXT NOT NULL,
                group_id TEXT NOT NULL,
                enrolled_at TEXT NOT NULL,
                PRIMARY KEY (student_id, group_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_enrollments_group ON enrollments (group_id);",
        )
        .execute(pool)
        .await?;

        // One sheet per (civil date, group), created lazily on the first
        // check-in of the day. The UNIQUE key makes that creation an upsert.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance_sheets (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                group_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (date, group_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // The composite primary key is the dedup key: at most one entry per
        // student per sheet.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance_entries (
                sheet_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                added_by TEXT NOT NULL,
                marked_at TEXT NOT NULL,
                PRIMARY KEY (sheet_id, student_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_attendance_entries_student ON attendance_entries (student_id);",
        )
        .execute(pool)
        .await?;

        // Append-only payment audit log. The monthly reset never touches it.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_history (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                paid_at TEXT NOT NULL,
                paid_by TEXT NOT NULL,
                amount REAL NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_payment_history_student ON payment_history (student_id);",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employees (
                id TEXT PRIMARY KEY,
                employee_name TEXT NOT NULL,
                phone TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'staff',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_setup_is_idempotent() {
        let db = DbConnection::init_test().await.expect("test db");
        // Running setup again against the same pool must not fail
        DbConnection::setup_schema(db.pool())
            .await
            .expect("second setup");
    }

    #[tokio::test]
    async fn tables_exist_after_init() {
        let db = DbConnection::init_test().await.expect("test db");
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("table listing");
        let names: Vec<&str> = names.iter().map(|(n,)| n.as_str()).collect();
        for expected in [
            "attendance_entries",
            "attendance_sheets",
            "employees",
            "enrollments",
            "groups",
            "payment_history",
            "students",
        ] {
            assert!(names.contains(&expected), "missing table {}", expected);
        }
    }
}
