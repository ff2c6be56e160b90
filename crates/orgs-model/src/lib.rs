//! # Organization Relationship Model
//!
//! This crate provides the data model shared by the organization stores and
//! the organization service.
//!
//! ## Overview
//!
//! The orgs-model crate handles:
//! - **Organizations**: Tenant entities owned by a single principal
//! - **Member relations**: Role assignments binding a member to an organization
//! - **Group relations**: Associations binding a group to exactly one organization
//! - **Pages**: Offset-based pagination requests and responses
//! - **Backups**: Full snapshots of the relational state
//!
//! ## Architecture
//!
//! ```text
//! Organization (owner_id)
//!   ├─ MemberRelation (org_id, member_id) ─→ role
//!   └─ GroupRelation  (group_id)          ─→ org_id
//!
//! Backup = [Organization] + [MemberRelation] + [GroupRelation]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use orgs_model::{roles, MemberRelation, Organization};
//!
//! let org = Organization::new("org-1", "principal-1", "acme");
//! let relation = MemberRelation::new(&org.id, "principal-2", roles::MEMBER);
//! assert_eq!(relation.org_id, "org-1");
//! ```

pub mod backup;
pub mod group;
pub mod membership;
pub mod metadata;
pub mod organization;
pub mod page;
pub mod roles;

// Re-export main types for convenience
pub use backup::{Backup, SnapshotViolation};
pub use group::{Group, GroupRelation};
pub use membership::{Member, MemberRelation};
pub use metadata::Metadata;
pub use organization::{OrgInput, Organization};
pub use page::{GroupRelationsPage, GroupsPage, MembersPage, OrgsPage, PageMetadata};
