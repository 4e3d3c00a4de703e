//! Attendance recording.
//!
//! Per (student, group, day) the state machine is just NOT_PRESENT →
//! PRESENT, reversible the same day by check-out. The interesting part is
//! holding the gates (identity, block, enrollment) and the dedup invariant
//! under concurrent check-ins: the day sheet is created by an atomic upsert
//! on its (date, group) key and the entry insert is guarded by the
//! (sheet, student) primary key, so two simultaneous first arrivals end up
//! on one sheet and a double check-in is refused without touching the
//! ledger.

use chrono::Utc;
use tracing::info;

use crate::domain::calendar;
use crate::domain::commands::attendance::{CheckInCommand, CheckInResult, CheckOutCommand};
use crate::domain::models::{AttendanceEntry, AttendanceLogEntry, RosterEntry};
use crate::domain::resolver::StudentResolver;
use crate::error::{DomainError, DomainResult, Entity};
use crate::notification::{self, NotificationDispatcher};
use crate::storage::{AttendanceRepository, GroupRepository, StudentRepository};

#[derive(Clone)]
pub struct AttendanceService {
    resolver: StudentResolver,
    students: StudentRepository,
    groups: GroupRepository,
    attendance: AttendanceRepository,
    notifier: NotificationDispatcher,
}

impl AttendanceService {
    pub fn new(
        resolver: StudentResolver,
        students: StudentRepository,
        groups: GroupRepository,
        attendance: AttendanceRepository,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            resolver,
            students,
            groups,
            attendance,
            notifier,
        }
    }

    /// Record a visit for whoever the search term resolves to.
    pub async fn check_in(&self, command: CheckInCommand) -> DomainResult<CheckInResult> {
        if command.group_id.trim().is_empty() {
            return Err(DomainError::validation("group_id", "يجب اختيار المجموعة"));
        }

        let student = self.resolver.resolve(&command.search_term).await?;

        if student.is_blocked {
            return Err(DomainError::Blocked {
                reason: student.block_reason.clone(),
                blocked_at: student.blocked_at,
            });
        }

        let enrolled = self.groups.groups_of(&student.id).await?;
        let group = match enrolled.iter().find(|g| g.id == command.group_id) {
            Some(group) => group.clone(),
            None => {
                return Err(DomainError::NotEnrolled {
                    enrolled_groups: enrolled.into_iter().map(|g| g.group_name).collect(),
                })
            }
        };

        let now = Utc::now();
        let date = calendar::civil_date_key(now);
        let sheet = self.attendance.upsert_sheet(&date, &group.id, now).await?;

        let entry = AttendanceEntry {
            sheet_id: sheet.id.clone(),
            student_id: student.id.clone(),
            added_by: command.actor_id.clone(),
            marked_at: now,
        };
        let inserted = self.attendance.insert_entry(&entry).await?;
        if !inserted {
            return Err(DomainError::AlreadyCheckedIn {
                student_name: student.student_name,
                group_name: group.group_name,
                date,
            });
        }

        let attendance_count = self
            .attendance
            .sheet_count_for(&student.id, &group.id)
            .await?;

        info!(
            student_code = %student.student_code,
            group_name = %group.group_name,
            date = %date,
            attendance_count,
            "checked student in"
        );

        // Best-effort, off the critical path: the visit is already recorded
        self.notifier.dispatch(
            student.parent_phone.clone(),
            notification::check_in_message(&student.student_name, &group.group_name, &date),
        );

        let roster = self.roster_with_counts(&date, &group.id).await?;
        let history = self.students.payment_history(&student.id).await?;
        let effective_paid = student.monthly_payment_paid || !history.is_empty();

        Ok(CheckInResult {
            student_id: student.id,
            student_name: student.student_name,
            student_code: student.student_code,
            effective_paid,
            group_name: group.group_name,
            attendance_count,
            roster,
        })
    }

    /// Undo a same-day check-in. Past days are a permanent ledger.
    pub async fn check_out(&self, command: CheckOutCommand) -> DomainResult<()> {
        let date = calendar::today_key();
        let removed = self
            .attendance
            .remove_entry(&date, &command.group_id, &command.student_id)
            .await?;
        if !removed {
            return Err(DomainError::not_found(Entity::AttendanceEntry));
        }
        info!(student_id = %command.student_id, group_id = %command.group_id, date = %date, "checked student out");
        Ok(())
    }

    /// Today's roster for a group, empty when nobody has checked in yet.
    pub async fn today_roster(&self, group_id: &str) -> DomainResult<Vec<RosterEntry>> {
        self.roster_with_counts(&calendar::today_key(), group_id)
            .await
    }

    /// A student's visit log across all groups, newest first.
    pub async fn student_history(&self, student_id: &str) -> DomainResult<Vec<AttendanceLogEntry>> {
        self.students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        Ok(self.attendance.log_for_student(student_id).await?)
    }

    async fn roster_with_counts(
        &self,
        date: &str,
        group_id: &str,
    ) -> DomainResult<Vec<RosterEntry>> {
        let rows = self.attendance.roster_rows(date, group_id).await?;
        let mut roster = Vec::with_capacity(rows.len());
        for row in rows {
            let attendance_count = self
                .attendance
                .sheet_count_for(&row.student_id, group_id)
                .await?;
            roster.push(RosterEntry {
                student_id: row.student_id,
                student_code: row.student_code,
                student_name: row.student_name,
                effective_paid: row.effective_paid,
                marked_at: row.marked_at,
                added_by: row.added_by,
                added_by_name: row.added_by_name,
                attendance_count,
            });
        }
        Ok(roster)
    }
}
