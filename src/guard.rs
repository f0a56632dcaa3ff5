//! Access control guard.
//!
//! Every protected operation declares one [`AccessRule`] below. Handlers run the role phase with
//! [`AccessRule::authorize`] before touching a service; services run the ownership phase with
//! [`AccessRule::check_owner`] once the resource has been resolved.

use thiserror::Error;
use uuid::Uuid;

use crate::{auth::Principal, models::Role};

/// Who may call an operation at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requires {
    /// Any valid principal.
    Authenticated,
    /// Exactly this role.
    Role(Role),
    /// Any one of these roles.
    AnyOf(&'static [Role]),
}

/// Whether the caller must also own the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Unscoped,
    Owner,
    /// Owner, or any admin.
    OwnerOrAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("insufficient role")]
    InsufficientRole,
    #[error("not the resource owner")]
    NotOwner,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessRule {
    pub operation: &'static str,
    pub requires: Requires,
    pub ownership: Ownership,
}

impl AccessRule {
    pub const fn new(operation: &'static str, requires: Requires, ownership: Ownership) -> Self {
        Self {
            operation,
            requires,
            ownership,
        }
    }

    /// Role phase. Returns the principal on success so handlers can pass it on.
    pub fn authorize<'p>(&self, principal: Option<&'p Principal>) -> Result<&'p Principal, Denied> {
        let Some(principal) = principal else {
            tracing::warn!(operation = self.operation, "rejected anonymous caller");
            return Err(Denied::Unauthenticated);
        };

        let allowed = match self.requires {
            Requires::Authenticated => true,
            Requires::Role(role) => principal.role == role,
            Requires::AnyOf(roles) => roles.contains(&principal.role),
        };

        if !allowed {
            tracing::warn!(
                operation = self.operation,
                user_id = %principal.id,
                role = %principal.role,
                "rejected caller with insufficient role"
            );
            return Err(Denied::InsufficientRole);
        }

        Ok(principal)
    }

    /// Ownership phase, against the already resolved owner of the resource.
    pub fn check_owner(&self, principal: &Principal, owner_id: Uuid) -> Result<(), Denied> {
        let allowed = match self.ownership {
            Ownership::Unscoped => true,
            Ownership::Owner => principal.id == owner_id,
            Ownership::OwnerOrAdmin => principal.is_admin() || principal.id == owner_id,
        };

        if !allowed {
            tracing::warn!(
                operation = self.operation,
                user_id = %principal.id,
                %owner_id,
                "rejected non-owner"
            );
            return Err(Denied::NotOwner);
        }

        Ok(())
    }
}

pub mod rules {
    use super::{AccessRule, Ownership, Requires};
    use crate::models::Role;

    pub const CURRENT_USER: AccessRule =
        AccessRule::new("current_user", Requires::Authenticated, Ownership::Unscoped);

    // --- Employer ---
    pub const CREATE_JOB: AccessRule =
        AccessRule::new("create_job", Requires::Role(Role::Employer), Ownership::Unscoped);
    pub const LIST_MY_JOBS: AccessRule =
        AccessRule::new("list_my_jobs", Requires::Role(Role::Employer), Ownership::Unscoped);
    pub const UPDATE_JOB: AccessRule =
        AccessRule::new("update_job", Requires::Role(Role::Employer), Ownership::Owner);
    pub const DELETE_JOB: AccessRule =
        AccessRule::new("delete_job", Requires::Role(Role::Employer), Ownership::Owner);
    pub const LIST_JOB_APPLICATIONS: AccessRule = AccessRule::new(
        "list_job_applications",
        Requires::Role(Role::Employer),
        Ownership::Owner,
    );
    pub const UPDATE_APPLICATION_STATUS: AccessRule = AccessRule::new(
        "update_application_status",
        Requires::AnyOf(&[Role::Employer, Role::Admin]),
        Ownership::OwnerOrAdmin,
    );

    // --- Job seeker ---
    pub const APPLY: AccessRule =
        AccessRule::new("apply", Requires::Role(Role::Jobseeker), Ownership::Unscoped);
    pub const LIST_MY_APPLICATIONS: AccessRule = AccessRule::new(
        "list_my_applications",
        Requires::Role(Role::Jobseeker),
        Ownership::Unscoped,
    );

    // --- Admin ---
    pub const ADMIN_LIST_JOBS: AccessRule =
        AccessRule::new("admin_list_jobs", Requires::Role(Role::Admin), Ownership::Unscoped);
    pub const ADMIN_DELETE_JOB: AccessRule =
        AccessRule::new("admin_delete_job", Requires::Role(Role::Admin), Ownership::Unscoped);
}
