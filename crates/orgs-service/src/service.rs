//! Organization service
//!
//! Resolves the caller, validates the request, authorizes it and delegates to
//! the repository. Authorization runs before any mutating store call:
//! - owner or admin: view, update, remove, member and group operations
//! - admin only: backup and restore
//! - any authenticated caller: create, list own organizations, list the
//!   memberships of a member

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use orgs_identity::{IdProvider, IdentityProvider};
use orgs_model::{
    Backup, Group, GroupRelation, GroupsPage, Member, MemberRelation, MembersPage, OrgInput,
    Organization, OrgsPage, PageMetadata,
};
use orgs_store::{OrgRepository, StoreResult};
use tracing::{debug, instrument, warn};

use crate::config::{ConfigError, ServiceConfig};
use crate::context::RequestContext;
use crate::directory::Directory;
use crate::error::{OrgError, OrgResult};
use crate::validation;

/// Organization operations exposed to transports.
///
/// Every operation takes the request context and the caller token.
#[async_trait]
pub trait OrgService: Send + Sync {
    /// Create an organization owned by the caller.
    async fn create_org(
        &self,
        ctx: &RequestContext,
        token: &str,
        input: OrgInput,
    ) -> OrgResult<Organization>;

    async fn view_org(&self, ctx: &RequestContext, token: &str, id: &str) -> OrgResult<Organization>;

    /// Replace name, description and metadata.
    ///
    /// ID, owner and creation time are kept from the stored record.
    async fn update_org(
        &self,
        ctx: &RequestContext,
        token: &str,
        id: &str,
        input: OrgInput,
    ) -> OrgResult<Organization>;

    /// Delete an organization together with its member and group relations.
    async fn remove_org(&self, ctx: &RequestContext, token: &str, id: &str) -> OrgResult<()>;

    /// Every organization for an admin, the caller's own otherwise.
    async fn list_orgs(
        &self,
        ctx: &RequestContext,
        token: &str,
        page: &PageMetadata,
    ) -> OrgResult<OrgsPage>;

    /// Organizations `member_id` belongs to.
    async fn list_org_memberships(
        &self,
        ctx: &RequestContext,
        token: &str,
        member_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<OrgsPage>;

    async fn assign_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        members: &[Member],
    ) -> OrgResult<()>;

    async fn unassign_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        member_ids: &[String],
    ) -> OrgResult<()>;

    async fn update_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        members: &[Member],
    ) -> OrgResult<()>;

    /// Members of an organization, with emails where the directory knows them.
    async fn list_org_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<MembersPage>;

    /// Associate groups with an organization, moving them from any other.
    async fn assign_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        group_ids: &[String],
    ) -> OrgResult<()>;

    async fn unassign_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        group_ids: &[String],
    ) -> OrgResult<()>;

    /// Groups of an organization, with details where the directory knows them.
    async fn list_org_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<GroupsPage>;

    /// Snapshot every organization and relation.
    async fn backup(&self, ctx: &RequestContext, token: &str) -> OrgResult<Backup>;

    /// Apply a snapshot as one unit.
    async fn restore(&self, ctx: &RequestContext, token: &str, backup: &Backup) -> OrgResult<()>;
}

/// [`OrgService`] over an [`OrgRepository`].
pub struct OrgServiceImpl {
    repo: Arc<dyn OrgRepository>,
    identity: Arc<dyn IdentityProvider>,
    ids: Arc<dyn IdProvider>,
    directory: Arc<dyn Directory>,
    config: ServiceConfig,
}

impl OrgServiceImpl {
    /// Wire the service to its collaborators.
    ///
    /// Fails if `config` does not pass [`ServiceConfig::validate`].
    pub fn new(
        repo: Arc<dyn OrgRepository>,
        identity: Arc<dyn IdentityProvider>,
        ids: Arc<dyn IdProvider>,
        directory: Arc<dyn Directory>,
        config: ServiceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            repo,
            identity,
            ids,
            directory,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn scoped(&self, ctx: &RequestContext) -> RequestContext {
        ctx.bounded(self.config.operation_timeout())
    }

    async fn identify(&self, ctx: &RequestContext, token: &str) -> OrgResult<String> {
        ctx.run(async { self.identity.identify(token).await.map_err(OrgError::from) })
            .await
    }

    async fn is_admin(&self, ctx: &RequestContext, principal: &str) -> OrgResult<bool> {
        ctx.run(async { Ok(self.identity.is_admin(principal).await) })
            .await
    }

    async fn require_admin(&self, ctx: &RequestContext, token: &str) -> OrgResult<String> {
        let principal = self.identify(ctx, token).await?;
        if !self.is_admin(ctx, &principal).await? {
            warn!(principal = %principal, "Admin operation denied");
            return Err(OrgError::forbidden("administrator rights required"));
        }
        Ok(principal)
    }

    /// Resolve the caller and load `org_id`, requiring the caller to own it or
    /// hold admin rights.
    async fn authorize(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
    ) -> OrgResult<Organization> {
        let principal = self.identify(ctx, token).await?;
        let org = store(ctx, self.repo.retrieve_by_id(org_id)).await?;

        if org.is_owned_by(&principal) || self.is_admin(ctx, &principal).await? {
            Ok(org)
        } else {
            warn!(principal = %principal, org_id = %org_id, "Organization access denied");
            Err(OrgError::forbidden(format!(
                "not the owner of organization {}",
                org_id
            )))
        }
    }

    fn member_relations(org_id: &str, members: &[Member]) -> Vec<MemberRelation> {
        let now = Utc::now();
        members
            .iter()
            .map(|m| MemberRelation::at(org_id, &m.id, &m.role, now))
            .collect()
    }
}

/// Race a store call against the request context.
async fn store<T, F>(ctx: &RequestContext, fut: F) -> OrgResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    ctx.run(async { fut.await.map_err(OrgError::from) }).await
}

#[async_trait]
impl OrgService for OrgServiceImpl {
    #[instrument(skip(self, ctx, token, input), fields(name = %input.name))]
    async fn create_org(
        &self,
        ctx: &RequestContext,
        token: &str,
        input: OrgInput,
    ) -> OrgResult<Organization> {
        let ctx = self.scoped(ctx);
        let principal = self.identify(&ctx, token).await?;
        validation::org_input(&input)?;

        let org = input.into_organization(self.ids.new_id(), principal, Utc::now());
        store(&ctx, self.repo.save(std::slice::from_ref(&org))).await?;

        debug!(org_id = %org.id, owner_id = %org.owner_id, "Created organization");
        Ok(org)
    }

    #[instrument(skip(self, ctx, token))]
    async fn view_org(&self, ctx: &RequestContext, token: &str, id: &str) -> OrgResult<Organization> {
        let ctx = self.scoped(ctx);
        validation::id("organization", id)?;
        self.authorize(&ctx, token, id).await
    }

    #[instrument(skip(self, ctx, token, input))]
    async fn update_org(
        &self,
        ctx: &RequestContext,
        token: &str,
        id: &str,
        input: OrgInput,
    ) -> OrgResult<Organization> {
        let ctx = self.scoped(ctx);
        validation::id("organization", id)?;
        validation::org_input(&input)?;

        let mut org = self.authorize(&ctx, token, id).await?;
        org.apply(input, Utc::now());
        store(&ctx, self.repo.update(&org)).await?;

        debug!("Updated organization");
        Ok(org)
    }

    #[instrument(skip(self, ctx, token))]
    async fn remove_org(&self, ctx: &RequestContext, token: &str, id: &str) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", id)?;

        let org = self.authorize(&ctx, token, id).await?;
        store(&ctx, self.repo.delete(&org.owner_id, &org.id)).await?;

        debug!("Removed organization");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, page), fields(offset = page.offset))]
    async fn list_orgs(
        &self,
        ctx: &RequestContext,
        token: &str,
        page: &PageMetadata,
    ) -> OrgResult<OrgsPage> {
        let ctx = self.scoped(ctx);
        let principal = self.identify(&ctx, token).await?;
        let page = validation::page(page, &self.config)?;

        if self.is_admin(&ctx, &principal).await? {
            store(&ctx, self.repo.retrieve_by_admin(&page)).await
        } else {
            store(&ctx, self.repo.retrieve_by_owner(&principal, &page)).await
        }
    }

    #[instrument(skip(self, ctx, token, page), fields(offset = page.offset))]
    async fn list_org_memberships(
        &self,
        ctx: &RequestContext,
        token: &str,
        member_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<OrgsPage> {
        let ctx = self.scoped(ctx);
        self.identify(&ctx, token).await?;
        validation::id("member", member_id)?;
        let page = validation::page(page, &self.config)?;

        store(&ctx, self.repo.retrieve_memberships(member_id, &page)).await
    }

    #[instrument(skip(self, ctx, token, members), fields(count = members.len()))]
    async fn assign_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        members: &[Member],
    ) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        validation::members(members)?;

        self.authorize(&ctx, token, org_id).await?;
        let relations = Self::member_relations(org_id, members);
        store(&ctx, self.repo.assign_members(&relations)).await?;

        debug!("Assigned members");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, member_ids), fields(count = member_ids.len()))]
    async fn unassign_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        member_ids: &[String],
    ) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        validation::ids("member", member_ids)?;

        self.authorize(&ctx, token, org_id).await?;
        store(&ctx, self.repo.unassign_members(org_id, member_ids)).await?;

        debug!("Unassigned members");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, members), fields(count = members.len()))]
    async fn update_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        members: &[Member],
    ) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        validation::members(members)?;

        self.authorize(&ctx, token, org_id).await?;
        let relations = Self::member_relations(org_id, members);
        store(&ctx, self.repo.update_members(&relations)).await?;

        debug!("Updated members");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, page), fields(offset = page.offset))]
    async fn list_org_members(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<MembersPage> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        let page = validation::page(page, &self.config)?;

        self.authorize(&ctx, token, org_id).await?;
        let mut members = store(&ctx, self.repo.retrieve_members(org_id, &page)).await?;

        if !members.members.is_empty() {
            let ids: Vec<String> = members.members.iter().map(|m| m.id.clone()).collect();
            let mut emails = ctx.run(self.directory.member_emails(&ids)).await?;
            for member in &mut members.members {
                if let Some(email) = emails.remove(&member.id) {
                    member.email = email;
                }
            }
        }

        Ok(members)
    }

    #[instrument(skip(self, ctx, token, group_ids), fields(count = group_ids.len()))]
    async fn assign_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        group_ids: &[String],
    ) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        validation::ids("group", group_ids)?;

        self.authorize(&ctx, token, org_id).await?;
        let now = Utc::now();
        let relations: Vec<GroupRelation> = group_ids
            .iter()
            .map(|group_id| GroupRelation::at(org_id, group_id, now))
            .collect();
        store(&ctx, self.repo.assign_groups(&relations)).await?;

        debug!("Assigned groups");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, group_ids), fields(count = group_ids.len()))]
    async fn unassign_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        group_ids: &[String],
    ) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        validation::ids("group", group_ids)?;

        self.authorize(&ctx, token, org_id).await?;
        store(&ctx, self.repo.unassign_groups(org_id, group_ids)).await?;

        debug!("Unassigned groups");
        Ok(())
    }

    #[instrument(skip(self, ctx, token, page), fields(offset = page.offset))]
    async fn list_org_groups(
        &self,
        ctx: &RequestContext,
        token: &str,
        org_id: &str,
        page: &PageMetadata,
    ) -> OrgResult<GroupsPage> {
        let ctx = self.scoped(ctx);
        validation::id("organization", org_id)?;
        let page = validation::page(page, &self.config)?;

        self.authorize(&ctx, token, org_id).await?;
        let relations = store(&ctx, self.repo.retrieve_groups(org_id, &page)).await?;

        let ids: Vec<String> = relations
            .group_relations
            .iter()
            .map(|r| r.group_id.clone())
            .collect();
        let mut details = if ids.is_empty() {
            Default::default()
        } else {
            ctx.run(self.directory.groups(&ids)).await?
        };
        let groups = ids
            .into_iter()
            .map(|id| details.remove(&id).unwrap_or_else(|| Group::with_id(id)))
            .collect();

        Ok(GroupsPage {
            page: relations.page,
            groups,
        })
    }

    #[instrument(skip(self, ctx, token))]
    async fn backup(&self, ctx: &RequestContext, token: &str) -> OrgResult<Backup> {
        let ctx = self.scoped(ctx);
        self.require_admin(&ctx, token).await?;

        let backup = store(&ctx, self.repo.snapshot()).await?;
        debug!(
            orgs = backup.orgs.len(),
            member_relations = backup.member_relations.len(),
            group_relations = backup.group_relations.len(),
            "Built backup"
        );
        Ok(backup)
    }

    #[instrument(skip(self, ctx, token, backup), fields(orgs = backup.orgs.len()))]
    async fn restore(&self, ctx: &RequestContext, token: &str, backup: &Backup) -> OrgResult<()> {
        let ctx = self.scoped(ctx);
        self.require_admin(&ctx, token).await?;
        backup.validate()?;

        store(&ctx, self.repo.restore(backup)).await?;
        debug!("Restored backup");
        Ok(())
    }
}
