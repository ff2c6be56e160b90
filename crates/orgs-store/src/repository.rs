//! Store traits
//!
//! The three stores share one backing repository so that cross-entity
//! operations (relation existence checks, cascade on delete, restore) can be
//! applied atomically by the adapter.

use async_trait::async_trait;
use orgs_model::{
    Backup, GroupRelation, GroupRelationsPage, MemberRelation, MembersPage, Organization,
    OrgsPage, PageMetadata,
};

use crate::error::StoreResult;

/// Organization persistence.
#[async_trait]
pub trait OrgStore: Send + Sync {
    /// Insert organizations as one batch.
    ///
    /// Fails with `Conflict` if any ID already exists (or repeats within the
    /// batch); nothing is inserted in that case.
    async fn save(&self, orgs: &[Organization]) -> StoreResult<()>;

    /// Replace an existing organization.
    ///
    /// Fails with `OrgNotFound` if the ID is absent.
    async fn update(&self, org: &Organization) -> StoreResult<()>;

    /// Delete an organization owned by `owner_id`, with its member and group
    /// relations.
    ///
    /// Fails with `OrgNotFound` if the organization does not exist or is owned
    /// by someone else.
    async fn delete(&self, owner_id: &str, id: &str) -> StoreResult<()>;

    async fn retrieve_by_id(&self, id: &str) -> StoreResult<Organization>;

    /// Organizations owned by `owner_id` matching the page filters.
    async fn retrieve_by_owner(&self, owner_id: &str, page: &PageMetadata)
        -> StoreResult<OrgsPage>;

    /// Organizations in which `member_id` holds a relation, matching the page
    /// filters.
    async fn retrieve_memberships(
        &self,
        member_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<OrgsPage>;

    /// Every organization, for backup.
    async fn retrieve_all(&self) -> StoreResult<Vec<Organization>>;

    /// Every organization matching the page filters, for administrators.
    async fn retrieve_by_admin(&self, page: &PageMetadata) -> StoreResult<OrgsPage>;
}

/// Member relation persistence.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Create or overwrite `(org_id, member_id)` role mappings as one batch.
    ///
    /// Fails with `OrgNotFound` if any relation references a missing
    /// organization; nothing is applied in that case. Overwriting keeps the
    /// stored `created_at`.
    async fn assign_members(&self, relations: &[MemberRelation]) -> StoreResult<()>;

    /// Remove the relations of `member_ids` with `org_id` as one batch.
    ///
    /// Fails with `OrgNotFound` if the organization is missing and with
    /// `MemberNotFound` if any member has no relation with it.
    async fn unassign_members(&self, org_id: &str, member_ids: &[String]) -> StoreResult<()>;

    /// Change roles; same upsert semantics as [`MembershipStore::assign_members`].
    async fn update_members(&self, relations: &[MemberRelation]) -> StoreResult<()>;

    /// Fails with `MemberNotFound` if no relation exists.
    async fn retrieve_role(&self, member_id: &str, org_id: &str) -> StoreResult<String>;

    /// Members of `org_id`, ordered by member ID.
    ///
    /// An unknown organization yields an empty page with a zero total.
    async fn retrieve_members(&self, org_id: &str, page: &PageMetadata)
        -> StoreResult<MembersPage>;

    /// Every member relation, for backup.
    async fn retrieve_all_member_relations(&self) -> StoreResult<Vec<MemberRelation>>;
}

/// Group relation persistence.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Associate groups with organizations as one batch.
    ///
    /// A group already associated with another organization moves to the new
    /// one. Fails with `OrgNotFound` if any relation references a missing
    /// organization; nothing is applied in that case.
    async fn assign_groups(&self, relations: &[GroupRelation]) -> StoreResult<()>;

    /// Remove the relations of `group_ids` with `org_id` as one batch.
    ///
    /// Fails with `OrgNotFound` if the organization is missing and with
    /// `GroupNotFound` if any group is not associated with it.
    async fn unassign_groups(&self, org_id: &str, group_ids: &[String]) -> StoreResult<()>;

    /// Group relations of `org_id`, ordered by group ID.
    ///
    /// An unknown organization yields an empty page with a zero total.
    async fn retrieve_groups(
        &self,
        org_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<GroupRelationsPage>;

    /// The organization `group_id` belongs to.
    ///
    /// Fails with `GroupNotFound` if the group has no relation.
    async fn retrieve_by_group_id(&self, group_id: &str) -> StoreResult<Organization>;

    /// Every group relation, for backup.
    async fn retrieve_all_group_relations(&self) -> StoreResult<Vec<GroupRelation>>;
}

/// The combined repository consumed by the organization service.
#[async_trait]
pub trait OrgRepository: OrgStore + MembershipStore + GroupStore {
    /// Apply a snapshot as one unit: organizations, then member relations,
    /// then group relations.
    ///
    /// Fails (applying nothing) with:
    /// - `Snapshot` if the snapshot breaks a uniqueness invariant
    /// - `Conflict` if an organization already exists
    /// - `OrgNotFound` if a relation references an organization present in
    ///   neither the snapshot nor the store
    ///
    /// Relations already present are overwritten, as assignment does.
    async fn restore(&self, backup: &Backup) -> StoreResult<()>;

    /// Read every organization and relation as of one point in time.
    ///
    /// Unlike three separate `retrieve_all*` calls, the result never holds a
    /// relation whose organization is missing, so it can always be restored
    /// into an empty store.
    async fn snapshot(&self) -> StoreResult<Backup>;
}
