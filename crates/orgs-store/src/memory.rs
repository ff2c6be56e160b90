//! In-memory repository implementation
//!
//! All three stores live behind one lock so that every batch, cascade and
//! restore happens in a single critical section. Suitable for tests and
//! single-process deployments.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use orgs_model::{
    Backup, GroupRelation, GroupRelationsPage, MemberRelation, MembersPage, Organization,
    OrgsPage, PageMetadata,
};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::repository::{GroupStore, MembershipStore, OrgRepository, OrgStore};

#[derive(Debug, Default)]
struct State {
    /// org_id -> organization
    orgs: BTreeMap<String, Organization>,
    /// (org_id, member_id) -> relation
    members: BTreeMap<(String, String), MemberRelation>,
    /// group_id -> relation
    groups: BTreeMap<String, GroupRelation>,
}

impl State {
    fn require_org(&self, org_id: &str) -> StoreResult<()> {
        if self.orgs.contains_key(org_id) {
            Ok(())
        } else {
            Err(StoreError::org_not_found(org_id))
        }
    }

    /// Filtered, key-ordered organizations.
    fn filter_orgs<F>(&self, page: &PageMetadata, mut keep: F) -> Vec<Organization>
    where
        F: FnMut(&Organization) -> bool,
    {
        self.orgs
            .values()
            .filter(|org| keep(org) && org.matches(page))
            .cloned()
            .collect()
    }

    fn upsert_member(&mut self, relation: &MemberRelation) {
        let key = (relation.org_id.clone(), relation.member_id.clone());
        self.members
            .entry(key)
            .and_modify(|existing| {
                existing.role = relation.role.clone();
                existing.updated_at = relation.updated_at;
            })
            .or_insert_with(|| relation.clone());
    }

    fn upsert_group(&mut self, relation: &GroupRelation) {
        // Reassignment to another org replaces the relation entirely
        self.groups
            .entry(relation.group_id.clone())
            .and_modify(|existing| {
                if existing.org_id == relation.org_id {
                    existing.updated_at = relation.updated_at;
                } else {
                    *existing = relation.clone();
                }
            })
            .or_insert_with(|| relation.clone());
    }

    fn assign_members(&mut self, relations: &[MemberRelation]) -> StoreResult<()> {
        for relation in relations {
            self.require_org(&relation.org_id)?;
        }
        for relation in relations {
            self.upsert_member(relation);
        }
        Ok(())
    }
}

/// In-memory organization repository.
///
/// Cloning shares the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrgRepository {
    state: Arc<RwLock<State>>,
}

impl MemoryOrgRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrgStore for MemoryOrgRepository {
    async fn save(&self, orgs: &[Organization]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        let mut seen = HashSet::with_capacity(orgs.len());
        for org in orgs {
            if state.orgs.contains_key(&org.id) || !seen.insert(org.id.as_str()) {
                return Err(StoreError::org_conflict(&org.id));
            }
        }
        for org in orgs {
            state.orgs.insert(org.id.clone(), org.clone());
        }

        Ok(())
    }

    async fn update(&self, org: &Organization) -> StoreResult<()> {
        let mut state = self.state.write().await;

        match state.orgs.get_mut(&org.id) {
            Some(existing) => {
                existing.name = org.name.clone();
                existing.description = org.description.clone();
                existing.metadata = org.metadata.clone();
                existing.updated_at = org.updated_at;
                Ok(())
            }
            None => Err(StoreError::org_not_found(&org.id)),
        }
    }

    async fn delete(&self, owner_id: &str, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;

        match state.orgs.get(id) {
            Some(org) if org.is_owned_by(owner_id) => {}
            _ => return Err(StoreError::org_not_found(id)),
        }

        state.orgs.remove(id);
        let members_before = state.members.len();
        state.members.retain(|(org_id, _), _| org_id != id);
        let groups_before = state.groups.len();
        state.groups.retain(|_, gr| gr.org_id != id);

        tracing::debug!(
            org_id = %id,
            member_relations = members_before - state.members.len(),
            group_relations = groups_before - state.groups.len(),
            "Deleted organization with its relations"
        );

        Ok(())
    }

    async fn retrieve_by_id(&self, id: &str) -> StoreResult<Organization> {
        let state = self.state.read().await;
        state
            .orgs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::org_not_found(id))
    }

    async fn retrieve_by_owner(
        &self,
        owner_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<OrgsPage> {
        let state = self.state.read().await;
        let matches = state.filter_orgs(page, |org| org.is_owned_by(owner_id));
        Ok(OrgsPage::paginate(matches, page))
    }

    async fn retrieve_memberships(
        &self,
        member_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<OrgsPage> {
        let state = self.state.read().await;
        let matches = state.filter_orgs(page, |org| {
            state
                .members
                .contains_key(&(org.id.clone(), member_id.to_string()))
        });
        Ok(OrgsPage::paginate(matches, page))
    }

    async fn retrieve_all(&self) -> StoreResult<Vec<Organization>> {
        let state = self.state.read().await;
        Ok(state.orgs.values().cloned().collect())
    }

    async fn retrieve_by_admin(&self, page: &PageMetadata) -> StoreResult<OrgsPage> {
        let state = self.state.read().await;
        let matches = state.filter_orgs(page, |_| true);
        Ok(OrgsPage::paginate(matches, page))
    }
}

#[async_trait]
impl MembershipStore for MemoryOrgRepository {
    async fn assign_members(&self, relations: &[MemberRelation]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.assign_members(relations)
    }

    async fn unassign_members(&self, org_id: &str, member_ids: &[String]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        state.require_org(org_id)?;
        for member_id in member_ids {
            let key = (org_id.to_string(), member_id.clone());
            if !state.members.contains_key(&key) {
                return Err(StoreError::member_not_found(org_id, member_id));
            }
        }
        for member_id in member_ids {
            state
                .members
                .remove(&(org_id.to_string(), member_id.clone()));
        }

        Ok(())
    }

    async fn update_members(&self, relations: &[MemberRelation]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.assign_members(relations)
    }

    async fn retrieve_role(&self, member_id: &str, org_id: &str) -> StoreResult<String> {
        let state = self.state.read().await;
        state
            .members
            .get(&(org_id.to_string(), member_id.to_string()))
            .map(|mr| mr.role.clone())
            .ok_or_else(|| StoreError::member_not_found(org_id, member_id))
    }

    async fn retrieve_members(
        &self,
        org_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<MembersPage> {
        let state = self.state.read().await;
        let matches = state
            .members
            .values()
            .filter(|mr| mr.org_id == org_id)
            .map(MemberRelation::to_member)
            .collect();
        Ok(MembersPage::paginate(matches, page))
    }

    async fn retrieve_all_member_relations(&self) -> StoreResult<Vec<MemberRelation>> {
        let state = self.state.read().await;
        Ok(state.members.values().cloned().collect())
    }
}

#[async_trait]
impl GroupStore for MemoryOrgRepository {
    async fn assign_groups(&self, relations: &[GroupRelation]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        for relation in relations {
            state.require_org(&relation.org_id)?;
        }
        for relation in relations {
            state.upsert_group(relation);
        }

        Ok(())
    }

    async fn unassign_groups(&self, org_id: &str, group_ids: &[String]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        state.require_org(org_id)?;
        for group_id in group_ids {
            match state.groups.get(group_id) {
                Some(gr) if gr.org_id == org_id => {}
                _ => return Err(StoreError::group_not_found(group_id)),
            }
        }
        for group_id in group_ids {
            state.groups.remove(group_id);
        }

        Ok(())
    }

    async fn retrieve_groups(
        &self,
        org_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<GroupRelationsPage> {
        let state = self.state.read().await;
        let matches = state
            .groups
            .values()
            .filter(|gr| gr.org_id == org_id)
            .cloned()
            .collect();
        Ok(GroupRelationsPage::paginate(matches, page))
    }

    async fn retrieve_by_group_id(&self, group_id: &str) -> StoreResult<Organization> {
        let state = self.state.read().await;
        state
            .groups
            .get(group_id)
            .and_then(|gr| state.orgs.get(&gr.org_id))
            .cloned()
            .ok_or_else(|| StoreError::group_not_found(group_id))
    }

    async fn retrieve_all_group_relations(&self) -> StoreResult<Vec<GroupRelation>> {
        let state = self.state.read().await;
        Ok(state.groups.values().cloned().collect())
    }
}

#[async_trait]
impl OrgRepository for MemoryOrgRepository {
    async fn restore(&self, backup: &Backup) -> StoreResult<()> {
        backup.validate()?;

        let mut state = self.state.write().await;

        for org in &backup.orgs {
            if state.orgs.contains_key(&org.id) {
                return Err(StoreError::org_conflict(&org.id));
            }
        }
        let restored = backup.org_ids();
        let known = |org_id: &str| restored.contains(org_id) || state.orgs.contains_key(org_id);
        for mr in &backup.member_relations {
            if !known(&mr.org_id) {
                return Err(StoreError::org_not_found(&mr.org_id));
            }
        }
        for gr in &backup.group_relations {
            if !known(&gr.org_id) {
                return Err(StoreError::org_not_found(&gr.org_id));
            }
        }

        for org in &backup.orgs {
            state.orgs.insert(org.id.clone(), org.clone());
        }
        for mr in &backup.member_relations {
            state.upsert_member(mr);
        }
        for gr in &backup.group_relations {
            state.upsert_group(gr);
        }

        tracing::debug!(
            orgs = backup.orgs.len(),
            member_relations = backup.member_relations.len(),
            group_relations = backup.group_relations.len(),
            "Restored snapshot"
        );

        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<Backup> {
        let state = self.state.read().await;
        Ok(Backup::new(
            state.orgs.values().cloned().collect(),
            state.members.values().cloned().collect(),
            state.groups.values().cloned().collect(),
        ))
    }
}
