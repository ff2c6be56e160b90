//! # Organization Stores
//!
//! This crate provides persistence for organizations, member relations and
//! group relations behind three store traits and two adapters.
//!
//! ## Overview
//!
//! The orgs-store crate handles:
//! - **Organization store**: organizations, existence and ownership checks
//! - **Membership store**: `(org, member) -> role` assignments
//! - **Group-association store**: `group -> org` assignments
//! - **Restore**: all-or-nothing application of a backup snapshot
//!
//! ## Features
//!
//! - `memory` (default): In-memory repository for tests and single-process use
//! - `postgres`: PostgreSQL repository backed by sqlx
//!
//! ## Consistency
//!
//! Every mutating operation applies its whole batch or nothing. Deleting an
//! organization cascades to its member and group relations. Listings are
//! ordered by key, but offset pages are not snapshot-consistent: concurrent
//! inserts or deletes between two page requests may shift items across pages.
//!
//! ## Cancellation
//!
//! Futures returned by the adapters may be dropped at any await point without
//! leaving a partial batch: the memory adapter mutates only inside one lock
//! guard with no await in between, and the PostgreSQL adapter rolls back an
//! uncommitted transaction when it is dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use orgs_model::{roles, MemberRelation, Organization};
//! use orgs_store::{MemoryOrgRepository, MembershipStore, OrgStore};
//!
//! async fn example() {
//!     let repo = MemoryOrgRepository::new();
//!     repo.save(&[Organization::new("org-1", "p1", "acme")]).await.unwrap();
//!     repo.assign_members(&[MemberRelation::new("org-1", "p2", roles::MEMBER)])
//!         .await
//!         .unwrap();
//!     assert_eq!(repo.retrieve_role("p2", "org-1").await.unwrap(), "member");
//! }
//! ```

pub mod error;
pub mod repository;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export main types
pub use error::{StoreError, StoreResult};
pub use repository::{GroupStore, MembershipStore, OrgRepository, OrgStore};

#[cfg(feature = "memory")]
pub use memory::MemoryOrgRepository;

#[cfg(feature = "postgres")]
pub use postgres::{PgConfig, PgOrgRepository};
