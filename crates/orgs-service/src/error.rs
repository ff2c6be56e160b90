//! Error types for organization service operations
//!
//! Every service failure carries a kind and the failing key(s). Store
//! internals (driver messages, SQL state) never reach the caller.

use orgs_identity::IdentityError;
use orgs_model::SnapshotViolation;
use orgs_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of an [`OrgError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    InvalidInput,
    Canceled,
    Internal,
}

/// Organization service error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgError {
    /// The referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind (e.g. "organization", "member")
        entity: &'static str,
        /// The failing key
        key: String,
    },

    /// The entity already exists, or a snapshot repeats a key
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Entity kind
        entity: &'static str,
        /// The conflicting key
        key: String,
    },

    /// The token could not be resolved to a principal
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is neither the owner nor an administrator
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request was canceled by the caller
    #[error("Operation canceled")]
    Canceled,

    /// The request deadline elapsed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Backend failure; details are logged, not returned
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for organization service operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl OrgError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        OrgError::Forbidden(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        OrgError::InvalidInput(message.into())
    }

    pub fn org_not_found(org_id: impl Into<String>) -> Self {
        OrgError::NotFound {
            entity: "organization",
            key: org_id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OrgError::NotFound { .. } => ErrorKind::NotFound,
            OrgError::Conflict { .. } => ErrorKind::Conflict,
            OrgError::Unauthorized(_) => ErrorKind::Unauthorized,
            OrgError::Forbidden(_) => ErrorKind::Forbidden,
            OrgError::InvalidInput(_) => ErrorKind::InvalidInput,
            OrgError::Canceled | OrgError::DeadlineExceeded => ErrorKind::Canceled,
            OrgError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, OrgError::Internal(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::NotFound { .. } => "NOT_FOUND",
            OrgError::Conflict { .. } => "CONFLICT",
            OrgError::Unauthorized(_) => "UNAUTHORIZED",
            OrgError::Forbidden(_) => "FORBIDDEN",
            OrgError::InvalidInput(_) => "INVALID_INPUT",
            OrgError::Canceled => "CANCELED",
            OrgError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            OrgError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for OrgError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrgNotFound { org_id } => OrgError::org_not_found(org_id),
            StoreError::MemberNotFound { org_id, member_id } => OrgError::NotFound {
                entity: "member",
                key: format!("{}/{}", org_id, member_id),
            },
            StoreError::GroupNotFound { group_id } => OrgError::NotFound {
                entity: "group",
                key: group_id,
            },
            StoreError::Conflict { entity, id } => OrgError::Conflict { entity, key: id },
            StoreError::Snapshot(violation) => violation.into(),
            StoreError::Database(detail) => {
                tracing::error!(error = %detail, "Store failure");
                OrgError::Internal("store unavailable".to_string())
            }
        }
    }
}

impl From<SnapshotViolation> for OrgError {
    fn from(violation: SnapshotViolation) -> Self {
        match violation {
            SnapshotViolation::DuplicateOrg { org_id } => OrgError::Conflict {
                entity: "organization",
                key: org_id,
            },
            SnapshotViolation::DuplicateMemberRelation { org_id, member_id } => OrgError::Conflict {
                entity: "member relation",
                key: format!("{}/{}", org_id, member_id),
            },
            SnapshotViolation::DuplicateGroupRelation { group_id } => OrgError::Conflict {
                entity: "group relation",
                key: group_id,
            },
        }
    }
}

impl From<IdentityError> for OrgError {
    fn from(err: IdentityError) -> Self {
        if err.is_server_error() {
            tracing::error!(error = %err, "Identity provider failure");
            return OrgError::Internal("identity provider unavailable".to_string());
        }
        match err {
            IdentityError::InvalidToken(reason) => OrgError::Unauthorized(reason),
            other => OrgError::Unauthorized(other.to_string()),
        }
    }
}
