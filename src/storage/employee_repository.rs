//! SQLite-backed employee storage. Employees are attribution references
//! only; authentication lives outside the engine.

use crate::domain::models::Employee;
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct EmployeeRepository {
    db: DbConnection,
}

impl EmployeeRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, employee: &Employee) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, employee_name, phone, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.employee_name)
        .bind(&employee.phone)
        .bind(&employee.role)
        .bind(employee.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY employee_name")
            .fetch_all(self.db.pool())
            .await
    }
}
