//! Member and group details lookup
//!
//! Listings return keys from the stores; display fields (member emails, group
//! names) belong to other services and are looked up through a [`Directory`].

use std::collections::HashMap;

use async_trait::async_trait;
use orgs_model::Group;

use crate::error::OrgResult;

/// Source of display details for members and groups.
///
/// Both lookups default to knowing nothing. IDs missing from a returned map
/// are rendered with empty details.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Emails keyed by member ID.
    async fn member_emails(&self, _member_ids: &[String]) -> OrgResult<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    /// Group details keyed by group ID.
    async fn groups(&self, _group_ids: &[String]) -> OrgResult<HashMap<String, Group>> {
        Ok(HashMap::new())
    }
}

/// A directory that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl Directory for NoDirectory {}

/// Fixed member and group tables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    emails: HashMap<String, String>,
    groups: HashMap<String, Group>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, member_id: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(member_id.into(), email.into());
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.insert(group.id.clone(), group);
        self
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn member_emails(&self, member_ids: &[String]) -> OrgResult<HashMap<String, String>> {
        Ok(member_ids
            .iter()
            .filter_map(|id| self.emails.get(id).map(|email| (id.clone(), email.clone())))
            .collect())
    }

    async fn groups(&self, group_ids: &[String]) -> OrgResult<HashMap<String, Group>> {
        Ok(group_ids
            .iter()
            .filter_map(|id| self.groups.get(id).map(|group| (id.clone(), group.clone())))
            .collect())
    }
}
