//! Identity and permission provider
//!
//! The provider turns a caller token into a principal ID and answers whether
//! that principal holds administrator (cross-tenant) rights.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::{IdentityError, IdentityResult};

/// Resolves caller tokens to principals.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `token` to a principal ID.
    ///
    /// Fails with [`IdentityError::InvalidToken`] for an empty, expired or
    /// unknown token.
    async fn identify(&self, token: &str) -> IdentityResult<String>;

    /// Check whether `principal_id` holds administrator rights.
    ///
    /// Implementations that cannot reach their backend answer `false`.
    async fn is_admin(&self, principal_id: &str) -> bool;
}

/// Fixed token table, for tests and single-tenant embedding.
///
/// # Examples
///
/// ```
/// use orgs_identity::{IdentityError, IdentityProvider, StaticIdentityProvider};
///
/// # async fn example() {
/// let identity = StaticIdentityProvider::new().with_principal("t1", "p1");
/// assert_eq!(identity.identify("t1").await, Ok("p1".to_string()));
/// assert!(matches!(identity.identify("nope").await, Err(IdentityError::InvalidToken(_))));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    /// token -> principal ID
    tokens: HashMap<String, String>,
    /// principal IDs with admin rights
    admins: HashSet<String>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a regular principal reachable through `token`.
    pub fn with_principal(mut self, token: impl Into<String>, principal_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), principal_id.into());
        self
    }

    /// Register an administrator reachable through `token`.
    pub fn with_admin(mut self, token: impl Into<String>, principal_id: impl Into<String>) -> Self {
        let principal_id = principal_id.into();
        self.admins.insert(principal_id.clone());
        self.tokens.insert(token.into(), principal_id);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn identify(&self, token: &str) -> IdentityResult<String> {
        if token.is_empty() {
            return Err(IdentityError::InvalidToken("missing token".to_string()));
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))
    }

    async fn is_admin(&self, principal_id: &str) -> bool {
        self.admins.contains(principal_id)
    }
}
