//! Group administration: create, rename, soft-delete.
//!
//! Membership counters and rosters are owned by the enrollment
//! synchronizer; this service never touches them beyond the delete guard.

use chrono::Utc;
use tracing::info;

use crate::domain::commands::groups::{CreateGroupCommand, UpdateGroupCommand};
use crate::domain::models::Group;
use crate::error::{DomainError, DomainResult, Entity};
use crate::storage::GroupRepository;

#[derive(Clone)]
pub struct GroupService {
    groups: GroupRepository,
}

impl GroupService {
    pub fn new(groups: GroupRepository) -> Self {
        Self { groups }
    }

    pub async fn create_group(&self, command: CreateGroupCommand) -> DomainResult<Group> {
        let name = command.group_name.trim().to_string();
        validate_group_name(&name)?;

        if self.groups.active_name_exists(&name, None).await? {
            return Err(DomainError::DuplicateGroupName { name });
        }

        let now = Utc::now();
        let group = Group {
            id: Group::generate_id(),
            group_name: name,
            group_description: command
                .group_description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            is_active: true,
            current_students: 0,
            created_at: now,
            updated_at: now,
        };
        self.groups.insert(&group).await?;

        info!(group_id = %group.id, group_name = %group.group_name, "created group");
        Ok(group)
    }

    pub async fn update_group(&self, command: UpdateGroupCommand) -> DomainResult<Group> {
        let group = self
            .groups
            .find_by_id(&command.group_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Group))?;

        let name = match command.group_name {
            Some(name) => {
                let name = name.trim().to_string();
                validate_group_name(&name)?;
                if name != group.group_name
                    && self
                        .groups
                        .active_name_exists(&name, Some(&group.id))
                        .await?
                {
                    return Err(DomainError::DuplicateGroupName { name });
                }
                name
            }
            None => group.group_name.clone(),
        };
        let description = command
            .group_description
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| group.group_description.clone());

        self.groups
            .update_group(&group.id, &name, &description, Utc::now())
            .await?;

        info!(group_id = %group.id, "updated group");
        self.get_group(&group.id).await
    }

    /// Soft-delete. Refused while any student is still enrolled.
    pub async fn delete_group(&self, group_id: &str) -> DomainResult<()> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Group))?;

        if group.current_students > 0 {
            return Err(DomainError::GroupNotEmpty {
                group_name: group.group_name,
                current_students: group.current_students,
            });
        }

        self.groups.soft_delete(group_id, Utc::now()).await?;
        info!(group_id, "soft-deleted group");
        Ok(())
    }

    pub async fn get_group(&self, group_id: &str) -> DomainResult<Group> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or(DomainError::not_found(Entity::Group))
    }

    pub async fn list_active_groups(&self) -> DomainResult<Vec<Group>> {
        Ok(self.groups.list_active().await?)
    }
}

fn validate_group_name(name: &str) -> DomainResult<()> {
    if name.chars().count() < 2 {
        return Err(DomainError::validation(
            "group_name",
            "اسم المجموعة يجب أن يكون أكثر من حرفين",
        ));
    }
    Ok(())
}
