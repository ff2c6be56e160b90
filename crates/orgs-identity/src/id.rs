//! Organization ID generation

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Generates collision-free IDs for new organizations.
pub trait IdProvider: Send + Sync {
    fn new_id(&self) -> String;
}

/// UUID v7 IDs (time-ordered).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn new_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Deterministic `{prefix}{n}` IDs, counting from 1.
///
/// # Examples
///
/// ```
/// use orgs_identity::{IdProvider, SequentialIdProvider};
///
/// let ids = SequentialIdProvider::new("org-");
/// assert_eq!(ids.new_id(), "org-1");
/// assert_eq!(ids.new_id(), "org-2");
/// ```
#[derive(Debug)]
pub struct SequentialIdProvider {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| UuidIdProvider.new_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdProvider::new("o");
        assert_eq!(ids.new_id(), "o1");
        assert_eq!(ids.new_id(), "o2");
        assert_eq!(ids.new_id(), "o3");
    }
}
