//! Storage layer: the SQLite connection plus one repository per entity.
//!
//! Repositories own the SQL; services own the rules. Anything that must be
//! atomic under concurrent writers (counter moves, ledger upserts, entry
//! dedup) is expressed as a single statement or transaction here rather
//! than as application-level read-modify-write.

pub mod attendance_repository;
pub mod connection;
pub mod employee_repository;
pub mod group_repository;
pub mod student_repository;

pub use attendance_repository::AttendanceRepository;
pub use connection::DbConnection;
pub use employee_repository::EmployeeRepository;
pub use group_repository::GroupRepository;
pub use student_repository::StudentRepository;
