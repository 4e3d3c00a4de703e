//! Domain-level command and query types
//! These structs are used by services inside the domain layer; the
//! transport layer (HTTP handlers, device webhook, scheduler hook) is
//! responsible for mapping its own payloads onto them.

pub mod students {
    /// Input for registering a new student.
    #[derive(Debug, Clone)]
    pub struct CreateStudentCommand {
        pub student_name: String,
        pub student_phone: String,
        pub parent_phone: String,
        pub school_name: Option<String>,
        /// Groups to enroll in; must be non-empty.
        pub group_ids: Vec<String>,
    }

    /// Input for updating an existing student.
    #[derive(Debug, Clone)]
    pub struct UpdateStudentCommand {
        pub student_id: String,
        pub student_name: String,
        pub student_phone: String,
        pub parent_phone: String,
        pub school_name: Option<String>,
        /// When present, replaces the student's group set (must be
        /// non-empty); when absent, membership is left alone.
        pub group_ids: Option<Vec<String>>,
    }

    /// Input for blocking a student from the center.
    #[derive(Debug, Clone)]
    pub struct BlockStudentCommand {
        pub student_id: String,
        pub reason: String,
        pub actor_id: String,
    }
}

pub mod groups {
    /// Input for creating a new group.
    #[derive(Debug, Clone)]
    pub struct CreateGroupCommand {
        pub group_name: String,
        pub group_description: Option<String>,
    }

    /// Input for updating a group.
    #[derive(Debug, Clone)]
    pub struct UpdateGroupCommand {
        pub group_id: String,
        pub group_name: Option<String>,
        pub group_description: Option<String>,
    }
}

pub mod attendance {
    use crate::domain::models::RosterEntry;

    /// Input for checking a student in. The search term is whatever the
    /// staff typed or the device scanned: a code, a phone number, or a name
    /// fragment.
    #[derive(Debug, Clone)]
    pub struct CheckInCommand {
        pub search_term: String,
        pub group_id: String,
        pub actor_id: String,
    }

    /// Result of a successful check-in: the card shown to staff plus the
    /// refreshed day roster.
    #[derive(Debug, Clone)]
    pub struct CheckInResult {
        pub student_id: String,
        pub student_name: String,
        pub student_code: String,
        pub effective_paid: bool,
        pub group_name: String,
        /// Visits of this student to this group, today included.
        pub attendance_count: i64,
        pub roster: Vec<RosterEntry>,
    }

    /// Input for removing a same-day check-in.
    #[derive(Debug, Clone)]
    pub struct CheckOutCommand {
        pub student_id: String,
        pub group_id: String,
    }
}

pub mod billing {
    use chrono::{DateTime, Utc};

    /// Input for recording a monthly payment.
    #[derive(Debug, Clone)]
    pub struct PayMonthlyCommand {
        pub student_id: String,
        pub actor_id: String,
        pub amount: Option<f64>,
    }

    /// Result of recording a monthly payment.
    #[derive(Debug, Clone)]
    pub struct PayMonthlyResult {
        pub student_name: String,
        pub paid_at: DateTime<Utc>,
    }

    /// Result of the bulk monthly reset.
    #[derive(Debug, Clone)]
    pub struct ResetMonthlyResult {
        /// Students whose flag was actually cleared; zero on a repeat run.
        pub affected: u64,
    }
}
