//! Offset-based pagination
//!
//! `PageMetadata` is both the request (offset, limit, filters) and the
//! response echo (offset, limit, total). Pages are not snapshot-consistent:
//! if the underlying set changes between two page requests, an item may be
//! skipped or returned twice.

use serde::{Deserialize, Serialize};

use crate::group::{Group, GroupRelation};
use crate::membership::Member;
use crate::metadata::Metadata;
use crate::organization::Organization;

/// Pagination request and response metadata.
///
/// A `limit` of `Some(0)` selects no items (the total is still reported).
/// A `limit` of `None` places no bound on the page at the store level; the
/// service substitutes its configured default limit before querying.
///
/// # Examples
///
/// ```
/// use orgs_model::PageMetadata;
///
/// let page = PageMetadata::new(2, 3);
/// let (items, echo) = page.paginate((0..10).collect::<Vec<_>>());
/// assert_eq!(items, vec![2, 3, 4]);
/// assert_eq!(echo.total, 10);
/// assert_eq!(echo.offset, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Number of matching items to skip
    #[serde(default)]
    pub offset: u64,

    /// Maximum number of items to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Case-insensitive name substring filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Metadata containment filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Total number of matching items (output only)
    #[serde(default)]
    pub total: u64,
}

impl PageMetadata {
    /// A page request with an explicit offset and limit.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// A page request selecting every matching item.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The response echo of this request for a result set of `total` items.
    pub fn echo(&self, total: u64) -> Self {
        Self {
            total,
            ..self.clone()
        }
    }

    /// Select this page's window from the full, ordered list of matches.
    ///
    /// # Returns
    ///
    /// The selected items alongside the response echo carrying the total
    pub fn paginate<T>(&self, matches: Vec<T>) -> (Vec<T>, Self) {
        let total = matches.len() as u64;
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        let items = matches.into_iter().skip(skip).take(take).collect();
        (items, self.echo(total))
    }
}

/// A page of organizations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgsPage {
    #[serde(flatten)]
    pub page: PageMetadata,
    pub orgs: Vec<Organization>,
}

impl OrgsPage {
    /// Paginate an ordered list of matching organizations.
    pub fn paginate(matches: Vec<Organization>, request: &PageMetadata) -> Self {
        let (orgs, page) = request.paginate(matches);
        Self { page, orgs }
    }
}

/// A page of organization members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembersPage {
    #[serde(flatten)]
    pub page: PageMetadata,
    pub members: Vec<Member>,
}

impl MembersPage {
    pub fn paginate(matches: Vec<Member>, request: &PageMetadata) -> Self {
        let (members, page) = request.paginate(matches);
        Self { page, members }
    }
}

/// A page of group relations, as returned by the group-association store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRelationsPage {
    #[serde(flatten)]
    pub page: PageMetadata,
    pub group_relations: Vec<GroupRelation>,
}

impl GroupRelationsPage {
    pub fn paginate(matches: Vec<GroupRelation>, request: &PageMetadata) -> Self {
        let (group_relations, page) = request.paginate(matches);
        Self {
            page,
            group_relations,
        }
    }
}

/// A page of groups with their details, as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupsPage {
    #[serde(flatten)]
    pub page: PageMetadata,
    pub groups: Vec<Group>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_selects_nothing() {
        let (items, echo) = PageMetadata::new(0, 0).paginate(vec![1, 2, 3]);
        assert!(items.is_empty());
        assert_eq!(echo.total, 3);
        assert_eq!(echo.limit, Some(0));
    }

    #[test]
    fn test_unbounded_selects_everything_after_offset() {
        let mut page = PageMetadata::unbounded();
        page.offset = 1;
        let (items, echo) = page.paginate(vec![1, 2, 3]);
        assert_eq!(items, vec![2, 3]);
        assert_eq!(echo.total, 3);
        assert_eq!(echo.limit, None);
    }

    #[test]
    fn test_offset_past_end() {
        let (items, echo) = PageMetadata::new(10, 5).paginate(vec![1, 2, 3]);
        assert!(items.is_empty());
        assert_eq!(echo.total, 3);
    }

    #[test]
    fn test_limit_below_total() {
        let n = 7;
        let (items, echo) = PageMetadata::new(0, n - 1).paginate((0..n).collect::<Vec<_>>());
        assert_eq!(items.len() as u64, n - 1);
        assert_eq!(echo.total, n);
    }

    #[test]
    fn test_echo_keeps_filters() {
        let request = PageMetadata::new(0, 5).with_name("acme");
        let echo = request.echo(42);
        assert_eq!(echo.name.as_deref(), Some("acme"));
        assert_eq!(echo.total, 42);
    }
}
