//! Store error types

use orgs_model::SnapshotViolation;
use thiserror::Error;

/// Store error types.
///
/// Every variant carries the key that failed so the service can report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Organization does not exist (or is not owned by the given principal)
    #[error("Organization not found: {org_id}")]
    OrgNotFound {
        /// The organization ID
        org_id: String,
    },

    /// No relation exists between the member and the organization
    #[error("Member {member_id} not found in organization {org_id}")]
    MemberNotFound {
        /// Organization ID
        org_id: String,
        /// Member ID
        member_id: String,
    },

    /// The group has no relation (to the given organization, if any)
    #[error("Group not found: {group_id}")]
    GroupNotFound {
        /// Group ID
        group_id: String,
    },

    /// An entity with this ID already exists
    #[error("{entity} already exists: {id}")]
    Conflict {
        /// Entity kind (e.g. "organization")
        entity: &'static str,
        /// The conflicting ID
        id: String,
    },

    /// A backup snapshot breaks a uniqueness invariant
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotViolation),

    /// Backend failure
    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn org_not_found(org_id: impl Into<String>) -> Self {
        StoreError::OrgNotFound {
            org_id: org_id.into(),
        }
    }

    pub fn member_not_found(org_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        StoreError::MemberNotFound {
            org_id: org_id.into(),
            member_id: member_id.into(),
        }
    }

    pub fn group_not_found(group_id: impl Into<String>) -> Self {
        StoreError::GroupNotFound {
            group_id: group_id.into(),
        }
    }

    pub fn org_conflict(org_id: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: "organization",
            id: org_id.into(),
        }
    }

    /// Check if this error is one of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::OrgNotFound { .. }
                | StoreError::MemberNotFound { .. }
                | StoreError::GroupNotFound { .. }
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
