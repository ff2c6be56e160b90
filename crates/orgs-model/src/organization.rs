//! Organization domain models
//!
//! This module provides the core Organization entity for multi-tenant
//! organization management. Organizations are the tenant boundary that owns
//! member relations and group relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;
use crate::page::PageMetadata;

/// An organization represents a tenant in the multi-tenant system.
///
/// The `id` is assigned once by an external ID provider and never changes.
/// The `owner_id` is the principal with full control over the organization.
///
/// # Lifecycle
///
/// ```text
/// nonexistent ─create─→ active ─update─→ active ─remove─→ deleted
/// ```
///
/// # Examples
///
/// ```
/// use orgs_model::Organization;
///
/// let org = Organization::new("org-1", "principal-1", "Acme Corp")
///     .with_description("Widgets");
/// assert_eq!(org.name, "Acme Corp");
/// assert_eq!(org.owner_id, "principal-1");
/// assert_eq!(org.created_at, org.updated_at);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: String,

    /// Owner principal ID (the principal who created the org)
    pub owner_id: String,

    /// Human-readable name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: Metadata,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `id` - The organization ID (from the ID provider)
    /// * `owner_id` - The principal who owns this organization
    /// * `name` - The organization name
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            description: String::new(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check whether `principal_id` owns this organization.
    pub fn is_owned_by(&self, principal_id: &str) -> bool {
        self.owner_id == principal_id
    }

    /// Replace the mutable fields from `input`.
    ///
    /// `id`, `owner_id` and `created_at` are left untouched.
    pub fn apply(&mut self, input: OrgInput, now: DateTime<Utc>) {
        self.name = input.name;
        self.description = input.description;
        self.metadata = input.metadata;
        self.updated_at = now;
    }

    /// Check whether this organization passes the name and metadata filters
    /// of a page request.
    ///
    /// The name filter is a case-insensitive substring match; the metadata
    /// filter is a containment match (see [`Metadata::contains`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use orgs_model::{Organization, PageMetadata};
    ///
    /// let org = Organization::new("org-1", "p1", "Acme Corp");
    /// assert!(org.matches(&PageMetadata::new(0, 10).with_name("acme")));
    /// assert!(!org.matches(&PageMetadata::new(0, 10).with_name("globex")));
    /// ```
    pub fn matches(&self, page: &PageMetadata) -> bool {
        let name_ok = match page.name.as_deref() {
            Some(name) if !name.is_empty() => self
                .name
                .to_lowercase()
                .contains(&name.to_lowercase()),
            _ => true,
        };
        let meta_ok = match &page.metadata {
            Some(filter) => self.metadata.contains(filter),
            None => true,
        };
        name_ok && meta_ok
    }
}

/// Caller-supplied fields for creating or updating an organization.
///
/// The service fills in the ID, owner and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgInput {
    /// Organization name (required)
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: String,

    /// Custom metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl OrgInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build an organization from this input.
    pub fn into_organization(
        self,
        id: impl Into<String>,
        owner_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Organization {
        Organization {
            id: id.into(),
            owner_id: owner_id.into(),
            name: self.name,
            description: self.description,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
