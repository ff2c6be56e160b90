//! Backup snapshots
//!
//! A backup is a full snapshot of organizations, member relations and group
//! relations. Restoring it must reproduce the same relational state, so a
//! snapshot that breaks a uniqueness invariant is rejected as a whole.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::group::GroupRelation;
use crate::membership::MemberRelation;
use crate::organization::Organization;

/// Invariant violations detected inside a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotViolation {
    /// The same organization ID appears more than once
    #[error("duplicate organization in snapshot: {org_id}")]
    DuplicateOrg {
        /// The repeated organization ID
        org_id: String,
    },

    /// The same (org, member) pair appears more than once
    #[error("duplicate member relation in snapshot: {org_id}/{member_id}")]
    DuplicateMemberRelation {
        /// Organization ID
        org_id: String,
        /// Member ID
        member_id: String,
    },

    /// A group is associated with more than one organization (or twice)
    #[error("group {group_id} appears in more than one relation in snapshot")]
    DuplicateGroupRelation {
        /// The repeated group ID
        group_id: String,
    },
}

/// Full snapshot of the relational state.
///
/// # Examples
///
/// ```
/// use orgs_model::{Backup, GroupRelation, Organization};
///
/// let backup = Backup::new(
///     vec![Organization::new("org-1", "p1", "acme")],
///     vec![],
///     vec![GroupRelation::new("org-1", "g1")],
/// );
/// assert!(backup.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default)]
    pub orgs: Vec<Organization>,

    #[serde(default)]
    pub member_relations: Vec<MemberRelation>,

    #[serde(default)]
    pub group_relations: Vec<GroupRelation>,
}

impl Backup {
    /// Build a snapshot, ordering every list by its key.
    pub fn new(
        mut orgs: Vec<Organization>,
        mut member_relations: Vec<MemberRelation>,
        mut group_relations: Vec<GroupRelation>,
    ) -> Self {
        orgs.sort_by(|a, b| a.id.cmp(&b.id));
        member_relations.sort_by(|a, b| a.key().cmp(&b.key()));
        group_relations.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        Self {
            orgs,
            member_relations,
            group_relations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orgs.is_empty() && self.member_relations.is_empty() && self.group_relations.is_empty()
    }

    /// Check the uniqueness invariants within this snapshot.
    ///
    /// Referential checks (relations pointing at organizations) depend on the
    /// target store and are left to it.
    pub fn validate(&self) -> Result<(), SnapshotViolation> {
        let mut org_ids = HashSet::with_capacity(self.orgs.len());
        for org in &self.orgs {
            if !org_ids.insert(org.id.as_str()) {
                return Err(SnapshotViolation::DuplicateOrg {
                    org_id: org.id.clone(),
                });
            }
        }

        let mut member_keys = HashSet::with_capacity(self.member_relations.len());
        for mr in &self.member_relations {
            if !member_keys.insert(mr.key()) {
                return Err(SnapshotViolation::DuplicateMemberRelation {
                    org_id: mr.org_id.clone(),
                    member_id: mr.member_id.clone(),
                });
            }
        }

        let mut group_owners: HashMap<&str, &str> =
            HashMap::with_capacity(self.group_relations.len());
        for gr in &self.group_relations {
            if group_owners
                .insert(gr.group_id.as_str(), gr.org_id.as_str())
                .is_some()
            {
                return Err(SnapshotViolation::DuplicateGroupRelation {
                    group_id: gr.group_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// IDs of the organizations contained in this snapshot.
    pub fn org_ids(&self) -> HashSet<&str> {
        self.orgs.iter().map(|o| o.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles;

    fn org(id: &str) -> Organization {
        Organization::new(id, "owner", id)
    }

    #[test]
    fn test_new_orders_by_key() {
        let backup = Backup::new(
            vec![org("b"), org("a")],
            vec![
                MemberRelation::new("b", "m1", roles::VIEWER),
                MemberRelation::new("a", "m2", roles::VIEWER),
            ],
            vec![GroupRelation::new("a", "g2"), GroupRelation::new("a", "g1")],
        );

        assert_eq!(backup.orgs[0].id, "a");
        assert_eq!(backup.member_relations[0].org_id, "a");
        assert_eq!(backup.group_relations[0].group_id, "g1");
    }

    #[test]
    fn test_duplicate_org_rejected() {
        let backup = Backup::new(vec![org("a"), org("a")], vec![], vec![]);
        assert_eq!(
            backup.validate(),
            Err(SnapshotViolation::DuplicateOrg {
                org_id: "a".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_member_relation_rejected() {
        let backup = Backup::new(
            vec![org("a")],
            vec![
                MemberRelation::new("a", "m1", roles::VIEWER),
                MemberRelation::new("a", "m1", roles::EDITOR),
            ],
            vec![],
        );
        assert!(matches!(
            backup.validate(),
            Err(SnapshotViolation::DuplicateMemberRelation { .. })
        ));
    }

    #[test]
    fn test_group_in_two_orgs_rejected() {
        let backup = Backup::new(
            vec![org("a"), org("b")],
            vec![],
            vec![GroupRelation::new("a", "g1"), GroupRelation::new("b", "g1")],
        );
        assert!(matches!(
            backup.validate(),
            Err(SnapshotViolation::DuplicateGroupRelation { .. })
        ));
    }

    #[test]
    fn test_same_member_in_two_orgs_is_fine() {
        let backup = Backup::new(
            vec![org("a"), org("b")],
            vec![
                MemberRelation::new("a", "m1", roles::VIEWER),
                MemberRelation::new("b", "m1", roles::EDITOR),
            ],
            vec![],
        );
        assert!(backup.validate().is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(Backup::default()).unwrap();
        assert!(value.get("orgs").is_some());
        assert!(value.get("member_relations").is_some());
        assert!(value.get("group_relations").is_some());
    }
}
