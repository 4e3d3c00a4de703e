//! Enrollment synchronization.
//!
//! Single writer for the student↔group relationship: every membership
//! change goes through here, and each one moves the enrollment rows and the
//! denormalized group counters together. Nothing else in the engine writes
//! those fields.

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::models::{Group, Student};
use crate::error::{DomainError, DomainResult, Entity};
use crate::storage::{GroupRepository, StudentRepository};

#[derive(Clone)]
pub struct EnrollmentService {
    groups: GroupRepository,
    students: StudentRepository,
}

impl EnrollmentService {
    pub fn new(groups: GroupRepository, students: StudentRepository) -> Self {
        Self { groups, students }
    }

    /// Check a requested group set without touching anything: dedupe it,
    /// refuse an empty set, and require every group to exist and be active.
    /// Returns the deduplicated set.
    pub(crate) async fn validate_group_set(
        &self,
        group_ids: &[String],
    ) -> DomainResult<Vec<String>> {
        let group_ids = dedupe(group_ids);
        if group_ids.is_empty() {
            return Err(DomainError::validation(
                "group_ids",
                "يجب اختيار مجموعة واحدة على الأقل",
            ));
        }
        self.require_active_groups(&group_ids).await?;
        Ok(group_ids)
    }

    /// Enroll a student into each of the given groups. The set must be
    /// non-empty — a student without a group is not a valid state.
    pub async fn enroll(&self, student_id: &str, group_ids: &[String]) -> DomainResult<u64> {
        let group_ids = self.validate_group_set(group_ids).await?;
        self.require_student(student_id).await?;

        let joined = self
            .groups
            .attach_student(student_id, &group_ids, Utc::now())
            .await?;
        info!(student_id, joined, "enrolled student");
        Ok(joined)
    }

    /// Replace the student's group set with `new_group_ids`, applying the
    /// symmetric difference in one transaction so counters and rosters can
    /// never be observed disagreeing mid-transfer.
    pub async fn update_enrollment(
        &self,
        student_id: &str,
        new_group_ids: &[String],
    ) -> DomainResult<()> {
        let new_group_ids = self.validate_group_set(new_group_ids).await?;
        self.require_student(student_id).await?;

        let current = self.groups.group_ids_of(student_id).await?;
        let to_add: Vec<String> = new_group_ids
            .iter()
            .filter(|id| !current.contains(id))
            .cloned()
            .collect();
        let to_remove: Vec<String> = current
            .iter()
            .filter(|id| !new_group_ids.contains(id))
            .cloned()
            .collect();

        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        let (joined, left) = self
            .groups
            .sync_membership(student_id, &to_add, &to_remove, Utc::now())
            .await?;
        info!(student_id, joined, left, "updated enrollment");
        Ok(())
    }

    /// Remove the student from every group they are enrolled in. Used as
    /// the precondition for hard-deleting a student.
    pub async fn detach(&self, student_id: &str) -> DomainResult<u64> {
        let current = self.groups.group_ids_of(student_id).await?;
        if current.is_empty() {
            return Ok(0);
        }
        let left = self
            .groups
            .detach_student(student_id, &current, Utc::now())
            .await?;
        info!(student_id, left, "detached student from all groups");
        Ok(left)
    }

    pub async fn groups_of(&self, student_id: &str) -> DomainResult<Vec<Group>> {
        Ok(self.groups.groups_of(student_id).await?)
    }

    pub async fn roster_of(&self, group_id: &str) -> DomainResult<Vec<Student>> {
        Ok(self.groups.roster_of(group_id).await?)
    }

    /// Consistency repair: recompute every group counter from the
    /// enrollment rows. A no-op on a consistent store; returns the number
    /// of counters that had drifted.
    pub async fn reconcile_counters(&self) -> DomainResult<u64> {
        let repaired = self.groups.recount_all(Utc::now()).await?;
        if repaired > 0 {
            warn!(repaired, "group counters had drifted and were repaired");
        }
        Ok(repaired)
    }

    async fn require_student(&self, student_id: &str) -> DomainResult<()> {
        self.students
            .find_by_id(student_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Student))?;
        Ok(())
    }

    async fn require_active_groups(&self, group_ids: &[String]) -> DomainResult<()> {
        for group_id in group_ids {
            let group = self
                .groups
                .find_by_id(group_id)
                .await?
                .ok_or(DomainError::not_found(Entity::Group))?;
            if !group.is_active {
                return Err(DomainError::not_found(Entity::Group));
            }
        }
        Ok(())
    }
}

/// Order-preserving dedup; requested sets are tiny.
fn dedupe(ids: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}
