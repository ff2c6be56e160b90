//! Membership domain models
//!
//! This module provides the member view and the member relation that links a
//! principal to an organization with a role. A member exists independently of
//! any organization; only the relation is scoped to one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A principal as seen from one organization.
///
/// The email is denormalized for display and is never used as a key.
///
/// # Examples
///
/// ```
/// use orgs_model::{roles, Member};
///
/// let member = Member::new("principal-2", roles::EDITOR).with_email("bob@example.com");
/// assert_eq!(member.role, "editor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Principal ID
    pub id: String,

    /// Role tag within the organization
    pub role: String,

    /// Display email (empty when unknown)
    #[serde(default)]
    pub email: String,
}

impl Member {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            email: String::new(),
        }
    }

    /// Set the display email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Role assignment linking a member to an organization.
///
/// At most one relation exists per `(org_id, member_id)` pair; assigning again
/// overwrites the role and keeps `created_at`.
///
/// # Examples
///
/// ```
/// use orgs_model::{roles, MemberRelation};
///
/// let relation = MemberRelation::new("org-1", "principal-2", roles::VIEWER);
/// assert_eq!(relation.key(), ("org-1", "principal-2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRelation {
    /// Organization ID
    pub org_id: String,

    /// Member (principal) ID
    pub member_id: String,

    /// Role tag within the organization
    pub role: String,

    /// When the member was first assigned
    pub created_at: DateTime<Utc>,

    /// When the role last changed
    pub updated_at: DateTime<Utc>,
}

impl MemberRelation {
    /// Creates a new relation stamped with the current time.
    pub fn new(
        org_id: impl Into<String>,
        member_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self::at(org_id, member_id, role, Utc::now())
    }

    /// Creates a new relation stamped with `now`.
    pub fn at(
        org_id: impl Into<String>,
        member_id: impl Into<String>,
        role: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            member_id: member_id.into(),
            role: role.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The uniqueness key of this relation.
    pub fn key(&self) -> (&str, &str) {
        (&self.org_id, &self.member_id)
    }

    /// The member view of this relation (without email).
    pub fn to_member(&self) -> Member {
        Member::new(&self.member_id, &self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles;

    #[test]
    fn test_member_relation_creation() {
        let relation = MemberRelation::new("org-1", "user-1", roles::EDITOR);

        assert_eq!(relation.org_id, "org-1");
        assert_eq!(relation.member_id, "user-1");
        assert_eq!(relation.role, roles::EDITOR);
        assert_eq!(relation.created_at, relation.updated_at);
    }

    #[test]
    fn test_to_member() {
        let relation = MemberRelation::new("org-1", "user-1", roles::ADMIN);
        let member = relation.to_member();

        assert_eq!(member.id, "user-1");
        assert_eq!(member.role, roles::ADMIN);
        assert!(member.email.is_empty());
    }
}
