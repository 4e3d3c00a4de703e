//! Student administration: registration, profile edits, blocking, and
//! hard deletion with enrollment detach.

use chrono::Utc;
use rand::Rng;
use tracing::{error, info};

use crate::domain::calendar;
use crate::domain::commands::students::{
    BlockStudentCommand, CreateStudentCommand, UpdateStudentCommand,
};
use crate::domain::enrollment_service::EnrollmentService;
use crate::domain::models::{Student, StudentProfile};
use crate::domain::resolver::StudentResolver;
use crate::error::{DomainError, DomainResult, Entity};
use crate::notification::{self, NotificationDispatcher};
use crate::storage::StudentRepository;

/// Fallback shown when registration omits the school.
const DEFAULT_SCHOOL_NAME: &str = "غير محدد";

const MAX_CODE_ATTEMPTS: u32 = 100;

#[derive(Clone)]
pub struct StudentService {
    students: StudentRepository,
    enrollment: EnrollmentService,
    resolver: StudentResolver,
    notifier: NotificationDispatcher,
}

impl StudentService {
    pub fn new(
        students: StudentRepository,
        enrollment: EnrollmentService,
        resolver: StudentResolver,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            students,
            enrollment,
            resolver,
            notifier,
        }
    }

    pub async fn create_student(
        &self,
        command: CreateStudentCommand,
    ) -> DomainResult<StudentProfile> {
        let name = command.student_name.trim().to_string();
        validate_student_name(&name)?;
        validate_phone("student_phone", &command.student_phone)?;
        validate_parent_phone(&command.parent_phone)?;

        // Validate the target groups before the student row exists, so a
        // bad request leaves nothing behind.
        let group_ids = self
            .enrollment
            .validate_group_set(&command.group_ids)
            .await?;

        if self.students.phone_exists(&command.student_phone, None).await? {
            return Err(DomainError::DuplicatePhone {
                phone: command.student_phone,
            });
        }

        let student_code = self.generate_student_code().await?;
        let now = Utc::now();
        let student = Student {
            id: Student::generate_id(),
            student_code,
            student_name: name,
            student_phone: command.student_phone,
            parent_phone: command.parent_phone,
            school_name: command
                .school_name
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()),
            monthly_payment_paid: false,
            monthly_payment_date: None,
            monthly_payment_paid_by: None,
            is_blocked: false,
            block_reason: String::new(),
            blocked_by: None,
            blocked_at: None,
            created_at: now,
            updated_at: now,
        };
        self.students.insert(&student).await?;

        // Compensate if enrollment fails (e.g. a group was deleted between
        // validation and here): a student row without groups must not
        // survive.
        if let Err(err) = self.enrollment.enroll(&student.id, &group_ids).await {
            error!(student_id = %student.id, error = %err, "enrollment failed, removing student");
            self.students.delete(&student.id).await?;
            return Err(err);
        }

        info!(student_id = %student.id, student_code = %student.student_code, "registered student");
        self.resolver.profile(student).await
    }

    pub async fn update_student(
        &self,
        command: UpdateStudentCommand,
    ) -> DomainResult<StudentProfile> {
        let name = command.student_name.trim().to_string();
        validate_student_name(&name)?;
        validate_phone("student_phone", &command.student_phone)?;
        validate_parent_phone(&command.parent_phone)?;

        let student = self
            .students
            .find_by_id(&command.student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;

        if self
            .students
            .phone_exists(&command.student_phone, Some(&student.id))
            .await?
        {
            return Err(DomainError::DuplicatePhone {
                phone: command.student_phone,
            });
        }

        let school_name = command
            .school_name
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string());
        self.students
            .update_profile(
                &student.id,
                &name,
                &command.student_phone,
                &command.parent_phone,
                &school_name,
                Utc::now(),
            )
            .await?;

        if let Some(group_ids) = &command.group_ids {
            self.enrollment
                .update_enrollment(&student.id, group_ids)
                .await?;
        }

        info!(student_id = %student.id, "updated student");
        self.get_student(&student.id).await
    }

    /// Hard delete. The student is detached from every group first so no
    /// counter or roster keeps pointing at them; historical attendance
    /// entries keep their soft reference.
    pub async fn delete_student(&self, student_id: &str) -> DomainResult<()> {
        self.students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;

        self.enrollment.detach(student_id).await?;
        self.students.delete(student_id).await?;
        info!(student_id, "deleted student");
        Ok(())
    }

    pub async fn block_student(&self, command: BlockStudentCommand) -> DomainResult<Student> {
        let reason = command.reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::validation("reason", "يجب إدخال سبب الحظر"));
        }

        let student = self
            .students
            .find_by_id(&command.student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        if student.is_blocked {
            return Err(DomainError::AlreadyBlocked);
        }

        self.students
            .set_block(&student.id, &reason, &command.actor_id, Utc::now())
            .await?;
        info!(student_id = %student.id, "blocked student");

        self.notifier.dispatch(
            student.parent_phone.clone(),
            notification::block_message(&student.student_name, &reason, &calendar::today_key()),
        );

        self.students
            .find_by_id(&student.id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))
    }

    pub async fn unblock_student(&self, student_id: &str) -> DomainResult<Student> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        if !student.is_blocked {
            return Err(DomainError::NotBlocked);
        }

        self.students.clear_block(&student.id, Utc::now()).await?;
        info!(student_id = %student.id, "unblocked student");

        self.notifier.dispatch(
            student.parent_phone.clone(),
            notification::unblock_message(&student.student_name, &calendar::today_key()),
        );

        self.students
            .find_by_id(&student.id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))
    }

    pub async fn get_student(&self, student_id: &str) -> DomainResult<StudentProfile> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        self.resolver.profile(student).await
    }

    pub async fn list_students(&self) -> DomainResult<Vec<StudentProfile>> {
        let students = self.students.list_all().await?;
        let mut profiles = Vec::with_capacity(students.len());
        for student in students {
            profiles.push(self.resolver.profile(student).await?);
        }
        Ok(profiles)
    }

    /// Draw random 4-digit codes until a free one turns up.
    async fn generate_student_code(&self) -> DomainResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = {
                let mut rng = rand::thread_rng();
                rng.gen_range(1000..10000).to_string()
            };
            if !self.students.code_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(DomainError::validation(
            "student_code",
            "تعذر توليد كود جديد للطالب، حاول مرة أخرى",
        ))
    }
}

fn validate_student_name(name: &str) -> DomainResult<()> {
    if name.chars().count() < 3 {
        return Err(DomainError::validation(
            "student_name",
            "اسم الطالب لازم يكون اكتر من 3 احرف",
        ));
    }
    Ok(())
}

fn validate_phone(field: &'static str, phone: &str) -> DomainResult<()> {
    if phone.len() != 11 || !phone.chars().all(|c| c.is_ascii_digit()) {
        let reason = if field == "student_phone" {
            "رقم الهاتف يجب ان يكون مكون من 11 رقم"
        } else {
            "رقم هاتف ولى الامر يجب ان يكون مكون من 11 رقم"
        };
        return Err(DomainError::validation(field, reason));
    }
    Ok(())
}

fn validate_parent_phone(phone: &str) -> DomainResult<()> {
    validate_phone("parent_phone", phone)
}
