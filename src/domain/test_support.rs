//! Shared fixtures for service tests: one in-memory database per test plus
//! seed helpers that write through the repositories.

use chrono::Utc;

use crate::domain::models::{Employee, Group, Student};
use crate::storage::{
    AttendanceRepository, DbConnection, EmployeeRepository, GroupRepository, StudentRepository,
};

pub(crate) struct TestContext {
    pub db: DbConnection,
    pub students: StudentRepository,
    pub groups: GroupRepository,
    pub attendance: AttendanceRepository,
    pub employees: EmployeeRepository,
}

pub(crate) async fn context() -> TestContext {
    let db = DbConnection::init_test().await.expect("test db");
    TestContext {
        students: StudentRepository::new(db.clone()),
        groups: GroupRepository::new(db.clone()),
        attendance: AttendanceRepository::new(db.clone()),
        employees: EmployeeRepository::new(db.clone()),
        db,
    }
}

impl TestContext {
    pub(crate) fn student_record(name: &str, code: &str, phone: &str) -> Student {
        let now = Utc::now();
        Student {
            id: Student::generate_id(),
            student_code: code.to_string(),
            student_name: name.to_string(),
            student_phone: phone.to_string(),
            parent_phone: "01099999999".to_string(),
            school_name: "غير محدد".to_string(),
            monthly_payment_paid: false,
            monthly_payment_date: None,
            monthly_payment_paid_by: None,
            is_blocked: false,
            block_reason: String::new(),
            blocked_by: None,
            blocked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert a student and enroll them in the given groups.
    pub(crate) async fn seed_student(
        &self,
        name: &str,
        code: &str,
        phone: &str,
        group_ids: &[String],
    ) -> Student {
        let student = Self::student_record(name, code, phone);
        self.students.insert(&student).await.expect("insert student");
        if !group_ids.is_empty() {
            self.groups
                .attach_student(&student.id, group_ids, Utc::now())
                .await
                .expect("attach student");
        }
        student
    }

    pub(crate) async fn seed_group(&self, name: &str) -> Group {
        let now = Utc::now();
        let group = Group {
            id: Group::generate_id(),
            group_name: name.to_string(),
            group_description: String::new(),
            is_active: true,
            current_students: 0,
            created_at: now,
            updated_at: now,
        };
        self.groups.insert(&group).await.expect("insert group");
        group
    }

    pub(crate) async fn seed_employee(&self, name: &str) -> Employee {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let employee = Employee {
            id: Employee::generate_id(),
            employee_name: name.to_string(),
            phone: format!("012{}", &suffix[..8]),
            role: "staff".to_string(),
            created_at: Utc::now(),
        };
        self.employees.insert(&employee).await.expect("insert employee");
        employee
    }
}
