//! Attendance and membership engine for a study center.
//!
//! Tracks daily physical attendance of students enrolled in one or more
//! instructional groups, keeps each group's member count and roster in
//! sync with enrollment changes, and drives the monthly payment lifecycle.
//! Everything transport-shaped — HTTP routing, UI, report generation, the
//! message transport, the fingerprint device, the cron scheduler — lives
//! outside this crate and talks to it through the [`Engine`] services and
//! the [`notification::NotificationGateway`] port.

pub mod error;
pub mod notification;

pub mod domain;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;

use domain::{
    AttendanceService, BillingService, EnrollmentService, GroupService, StudentResolver,
    StudentService,
};
use notification::{NotificationDispatcher, NotificationGateway};
use storage::{
    AttendanceRepository, DbConnection, EmployeeRepository, GroupRepository, StudentRepository,
};

/// Main engine struct that orchestrates all services
pub struct Engine {
    pub resolver: StudentResolver,
    pub group_service: GroupService,
    pub enrollment_service: EnrollmentService,
    pub student_service: StudentService,
    pub attendance_service: AttendanceService,
    pub billing_service: BillingService,
    pub employees: EmployeeRepository,
}

impl Engine {
    /// Create a new engine over the given database, sending outbound
    /// notifications through the given gateway.
    pub async fn new(database_url: &str, gateway: Arc<dyn NotificationGateway>) -> Result<Self> {
        let db = DbConnection::new(database_url).await?;
        Ok(Self::with_connection(db, gateway))
    }

    /// Create a new engine over the default database with the logging
    /// gateway.
    pub async fn init() -> Result<Self> {
        let db = DbConnection::init().await?;
        Ok(Self::with_connection(
            db,
            Arc::new(notification::LoggingGateway),
        ))
    }

    /// Wire every service over an existing connection.
    pub fn with_connection(db: DbConnection, gateway: Arc<dyn NotificationGateway>) -> Self {
        let students = StudentRepository::new(db.clone());
        let groups = GroupRepository::new(db.clone());
        let attendance = AttendanceRepository::new(db.clone());
        let employees = EmployeeRepository::new(db.clone());
        let notifier = NotificationDispatcher::new(gateway);

        let resolver = StudentResolver::new(students.clone(), groups.clone());
        let group_service = GroupService::new(groups.clone());
        let enrollment_service = EnrollmentService::new(groups.clone(), students.clone());
        let student_service = StudentService::new(
            students.clone(),
            enrollment_service.clone(),
            resolver.clone(),
            notifier.clone(),
        );
        let attendance_service = AttendanceService::new(
            resolver.clone(),
            students.clone(),
            groups.clone(),
            attendance,
            notifier.clone(),
        );
        let billing_service = BillingService::new(students, resolver.clone(), notifier);

        Engine {
            resolver,
            group_service,
            enrollment_service,
            student_service,
            attendance_service,
            billing_service,
            employees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::attendance::CheckInCommand;
    use crate::domain::commands::billing::PayMonthlyCommand;
    use crate::domain::commands::groups::CreateGroupCommand;
    use crate::domain::commands::students::CreateStudentCommand;
    use crate::domain::models::Employee;
    use crate::notification::testing::RecordingGateway;

    async fn engine() -> Engine {
        let db = DbConnection::init_test().await.expect("test db");
        Engine::with_connection(db, Arc::new(RecordingGateway::default()))
    }

    // End-to-end pass over the whole surface: register, check in, pay,
    // reset, delete.
    #[tokio::test]
    async fn full_day_at_the_center() {
        let engine = engine().await;

        let actor = Employee {
            id: Employee::generate_id(),
            employee_name: "Mr. Hossam".into(),
            phone: "01200000000".into(),
            role: "staff".into(),
            created_at: chrono::Utc::now(),
        };
        engine.employees.insert(&actor).await.expect("seed employee");

        let math = engine
            .group_service
            .create_group(CreateGroupCommand {
                group_name: "Math-A".into(),
                group_description: None,
            })
            .await
            .expect("create group");

        let profile = engine
            .student_service
            .create_student(CreateStudentCommand {
                student_name: "Ahmed Samir".into(),
                student_phone: "01011111111".into(),
                parent_phone: "01099999999".into(),
                school_name: None,
                group_ids: vec![math.id.clone()],
            })
            .await
            .expect("register student");

        let result = engine
            .attendance_service
            .check_in(CheckInCommand {
                search_term: profile.student.student_code.clone(),
                group_id: math.id.clone(),
                actor_id: actor.id.clone(),
            })
            .await
            .expect("check in");
        assert_eq!(result.attendance_count, 1);

        engine
            .billing_service
            .pay_monthly(PayMonthlyCommand {
                student_id: profile.student.id.clone(),
                actor_id: actor.id.clone(),
                amount: Some(200.0),
            })
            .await
            .expect("pay");

        let reset = engine
            .billing_service
            .reset_all_monthly()
            .await
            .expect("reset");
        assert_eq!(reset.affected, 1);

        engine
            .student_service
            .delete_student(&profile.student.id)
            .await
            .expect("delete student");
        engine
            .group_service
            .delete_group(&math.id)
            .await
            .expect("delete empty group");
    }
}
