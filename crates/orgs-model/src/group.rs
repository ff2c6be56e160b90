//! Group association models
//!
//! Groups are resource-grouping entities whose lifecycle lives outside this
//! crate; only their association to an organization is modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Details of a group, as supplied by the service that owns groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: String,

    /// Owner principal ID
    #[serde(default)]
    pub owner_id: String,

    /// Group name
    #[serde(default)]
    pub name: String,

    /// Group description
    #[serde(default)]
    pub description: String,
}

impl Group {
    /// A group known only by its ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Association of a group with an organization.
///
/// A group belongs to at most one organization at a time, so stores key this
/// relation by `group_id`.
///
/// # Examples
///
/// ```
/// use orgs_model::GroupRelation;
///
/// let relation = GroupRelation::new("org-1", "group-1");
/// assert_eq!(relation.group_id, "group-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRelation {
    /// Organization ID
    pub org_id: String,

    /// Group ID
    pub group_id: String,

    /// When the group was assigned to this organization
    pub created_at: DateTime<Utc>,

    /// When the relation was last touched
    pub updated_at: DateTime<Utc>,
}

impl GroupRelation {
    /// Creates a new relation stamped with the current time.
    pub fn new(org_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::at(org_id, group_id, Utc::now())
    }

    /// Creates a new relation stamped with `now`.
    pub fn at(org_id: impl Into<String>, group_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            org_id: org_id.into(),
            group_id: group_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
