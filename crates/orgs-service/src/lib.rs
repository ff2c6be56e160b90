//! # Organization Service
//!
//! This crate provides the organization service: the layer that resolves the
//! caller, enforces ownership and admin rights, validates requests and drives
//! the organization stores.
//!
//! ## Overview
//!
//! The orgs-service crate handles:
//! - **Organizations**: create, view, update, remove and list
//! - **Members**: bulk assign, unassign and role updates; paginated listing
//! - **Groups**: bulk assign and unassign; paginated listing
//! - **Backup/restore**: admin-only snapshot and all-or-nothing restore
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use orgs_identity::{StaticIdentityProvider, UuidIdProvider};
//! use orgs_model::{roles, Member, OrgInput, PageMetadata};
//! use orgs_service::{NoDirectory, OrgService, OrgServiceImpl, RequestContext, ServiceConfig};
//! use orgs_store::MemoryOrgRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = OrgServiceImpl::new(
//!     Arc::new(MemoryOrgRepository::new()),
//!     Arc::new(StaticIdentityProvider::new().with_principal("token-alice", "alice")),
//!     Arc::new(UuidIdProvider),
//!     Arc::new(NoDirectory),
//!     ServiceConfig::from_env(),
//! )?;
//!
//! let ctx = RequestContext::new();
//! let org = service.create_org(&ctx, "token-alice", OrgInput::new("acme")).await?;
//! service
//!     .assign_members(&ctx, "token-alice", &org.id, &[Member::new("bob", roles::MEMBER)])
//!     .await?;
//!
//! let members = service
//!     .list_org_members(&ctx, "token-alice", &org.id, &PageMetadata::unbounded())
//!     .await?;
//! assert_eq!(members.page.total, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod service;

mod validation;

// Re-export main types
pub use config::{ConfigError, ServiceConfig};
pub use context::RequestContext;
pub use directory::{Directory, NoDirectory, StaticDirectory};
pub use error::{ErrorKind, OrgError, OrgResult};
pub use service::{OrgService, OrgServiceImpl};
