//! # Organization Identity Seams
//!
//! This crate defines the external collaborators the organization service
//! consumes but does not implement.
//!
//! ## Overview
//!
//! The orgs-identity crate handles:
//! - **Identity**: Resolving a caller token to a principal ID
//! - **Permissions**: Deciding whether a principal holds administrator rights
//! - **IDs**: Generating collision-free organization IDs
//!
//! Token issuance and credential verification live in the authentication
//! service; implement [`IdentityProvider`] as a client of it.
//!
//! ## Usage
//!
//! ```rust
//! use orgs_identity::{IdProvider, IdentityProvider, StaticIdentityProvider, UuidIdProvider};
//!
//! # async fn example() {
//! let identity = StaticIdentityProvider::new()
//!     .with_principal("token-alice", "alice")
//!     .with_admin("token-root", "root");
//!
//! let alice = identity.identify("token-alice").await.unwrap();
//! assert_eq!(alice, "alice");
//! assert!(!identity.is_admin(&alice).await);
//!
//! let id = UuidIdProvider.new_id();
//! assert_eq!(id.len(), 36);
//! # }
//! ```

pub mod error;
pub mod id;
pub mod provider;

// Re-export main types
pub use error::{IdentityError, IdentityResult};
pub use id::{IdProvider, SequentialIdProvider, UuidIdProvider};
pub use provider::{IdentityProvider, StaticIdentityProvider};
