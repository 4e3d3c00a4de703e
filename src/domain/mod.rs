//! # Domain Module
//!
//! Business logic of the attendance engine, independent of any transport
//! or UI. Services own the rules; the storage layer owns the SQL.
//!
//! ## Module Organization
//!
//! - **resolver**: maps a raw search term (code, phone, name fragment) to
//!   exactly one student
//! - **group_service**: group administration and the delete guard
//! - **enrollment_service**: single writer for the student↔group
//!   relationship and its denormalized counters
//! - **student_service**: registration, profile edits, blocking, deletion
//! - **attendance_service**: the per-day check-in/check-out ledger
//! - **billing_service**: monthly payment flag, audit history, bulk reset
//! - **calendar**: the civil date key everything above partitions by

pub mod calendar;
pub mod commands;
pub mod models;

pub mod attendance_service;
pub mod billing_service;
pub mod enrollment_service;
pub mod group_service;
pub mod resolver;
pub mod student_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use attendance_service::AttendanceService;
pub use billing_service::BillingService;
pub use enrollment_service::EnrollmentService;
pub use group_service::GroupService;
pub use resolver::StudentResolver;
pub use student_service::StudentService;
