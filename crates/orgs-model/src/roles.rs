//! Member role tags
//!
//! Roles are plain string tags stored on member relations. The tags below are
//! the ones the service accepts on assignment.

/// Full organization control.
pub const OWNER: &str = "owner";

/// Can manage members and groups.
pub const ADMIN: &str = "admin";

/// Can create and edit content.
pub const EDITOR: &str = "editor";

/// Read-only access.
pub const VIEWER: &str = "viewer";

/// Plain membership.
pub const MEMBER: &str = "member";

/// Every accepted role tag.
pub const ALL: [&str; 5] = [OWNER, ADMIN, EDITOR, VIEWER, MEMBER];

/// Check whether `role` is an accepted tag (exact, lowercase match).
///
/// # Examples
///
/// ```
/// use orgs_model::roles;
///
/// assert!(roles::is_known("viewer"));
/// assert!(!roles::is_known("VIEWER"));
/// assert!(!roles::is_known("superuser"));
/// ```
pub fn is_known(role: &str) -> bool {
    ALL.contains(&role)
}
