//! Typed error taxonomy for the engine.
//!
//! Every state-changing operation surfaces one of these variants; callers
//! (HTTP layer, device webhook handler, CLI tooling) branch on [`ErrorKind`]
//! and show [`DomainError::user_message`] to staff. Notification delivery
//! failures deliberately live in a separate type ([`crate::notification::NotificationError`])
//! because they never fail the operation that triggered them.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A candidate surfaced by an ambiguous name search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub student_code: String,
    pub student_name: String,
}

/// Entities that can be reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Student,
    Group,
    Employee,
    AttendanceEntry,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Student => "student",
            Entity::Group => "group",
            Entity::Employee => "employee",
            Entity::AttendanceEntry => "attendance entry",
        };
        write!(f, "{}", name)
    }
}

/// Errors produced by the domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed on {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{entity} not found")]
    NotFound { entity: Entity },

    #[error("phone number {phone} already registered")]
    DuplicatePhone { phone: String },

    #[error("group name '{name}' already in use")]
    DuplicateGroupName { name: String },

    #[error("group '{group_name}' still has {current_students} enrolled students")]
    GroupNotEmpty {
        group_name: String,
        current_students: i64,
    },

    #[error("student '{student_name}' already checked in on {date} for group '{group_name}'")]
    AlreadyCheckedIn {
        student_name: String,
        group_name: String,
        date: String,
    },

    #[error("search term matches {} students", .matches.len())]
    AmbiguousSearch { matches: Vec<SearchMatch> },

    #[error("student is blocked: {reason}")]
    Blocked {
        reason: String,
        blocked_at: Option<DateTime<Utc>>,
    },

    /// The student exists but is not enrolled in the requested group.
    /// Carries the student's actual group names so the caller can redirect.
    #[error("student is not enrolled in the requested group")]
    NotEnrolled { enrolled_groups: Vec<String> },

    #[error("student is already blocked")]
    AlreadyBlocked,

    #[error("student is not blocked")]
    NotBlocked,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Coarse classification used by transport layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Blocked,
    NotEnrolled,
    Storage,
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: Entity) -> Self {
        DomainError::NotFound { entity }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation { .. } => ErrorKind::Validation,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::DuplicatePhone { .. }
            | DomainError::DuplicateGroupName { .. }
            | DomainError::GroupNotEmpty { .. }
            | DomainError::AlreadyCheckedIn { .. }
            | DomainError::AmbiguousSearch { .. }
            | DomainError::AlreadyBlocked
            | DomainError::NotBlocked => ErrorKind::Conflict,
            DomainError::Blocked { .. } => ErrorKind::Blocked,
            DomainError::NotEnrolled { .. } => ErrorKind::NotEnrolled,
            DomainError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Staff-facing message in the deployment language.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Validation { reason, .. } => reason.clone(),
            DomainError::NotFound {
                entity: Entity::Student,
            } => "هذا الطالب غير موجود".to_string(),
            DomainError::NotFound {
                entity: Entity::Group,
            } => "المجموعة غير موجودة".to_string(),
            DomainError::NotFound {
                entity: Entity::Employee,
            } => "الموظف غير موجود".to_string(),
            DomainError::NotFound {
                entity: Entity::AttendanceEntry,
            } => "لا يوجد تسجيل حضور لهذا الطالب اليوم".to_string(),
            DomainError::DuplicatePhone { .. } => "رقم هاتف الطالب موجود بالفعل".to_string(),
            DomainError::DuplicateGroupName { .. } => "اسم المجموعة موجود بالفعل".to_string(),
            DomainError::GroupNotEmpty { .. } => {
                "لا يمكن حذف المجموعة لوجود طلاب مسجلين بها".to_string()
            }
            DomainError::AlreadyCheckedIn { .. } => {
                "تم تسجيل حضور الطالب بالفعل لهذه المجموعة".to_string()
            }
            DomainError::AmbiguousSearch { matches } => format!(
                "يوجد {} طلاب يطابقون البحث، استخدم كود الطالب",
                matches.len()
            ),
            DomainError::Blocked { .. } => "هذا الطالب محظور من المركز".to_string(),
            DomainError::NotEnrolled { .. } => {
                "هذا الطالب غير مسجل في المجموعة المختارة".to_string()
            }
            DomainError::AlreadyBlocked => "Student is already blocked".to_string(),
            DomainError::NotBlocked => "Student is not blocked".to_string(),
            DomainError::Storage(_) => "يبدو ان هناك مشكله ما حاول مره اخري".to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
