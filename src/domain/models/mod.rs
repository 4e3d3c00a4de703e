//! Domain models shared across services and repositories.

pub mod attendance;
pub mod employee;
pub mod group;
pub mod payment;
pub mod student;

pub use attendance::{AttendanceEntry, AttendanceLogEntry, AttendanceSheet, RosterEntry};
pub use employee::Employee;
pub use group::Group;
pub use payment::{LastPayment, PaymentRecord, PaymentStatus};
pub use student::{Student, StudentProfile};
