//! Request validation
//!
//! All checks run before any store access.

use std::collections::HashSet;

use orgs_model::{roles, Member, OrgInput, PageMetadata};

use crate::config::ServiceConfig;
use crate::error::{OrgError, OrgResult};

pub(crate) fn org_input(input: &OrgInput) -> OrgResult<()> {
    if input.name.trim().is_empty() {
        return Err(OrgError::invalid_input("organization name is required"));
    }
    Ok(())
}

pub(crate) fn id(kind: &str, value: &str) -> OrgResult<()> {
    if value.trim().is_empty() {
        return Err(OrgError::invalid_input(format!("{} ID is required", kind)));
    }
    Ok(())
}

/// A non-empty batch of distinct, non-empty IDs.
pub(crate) fn ids(kind: &str, values: &[String]) -> OrgResult<()> {
    if values.is_empty() {
        return Err(OrgError::invalid_input(format!("at least one {} ID is required", kind)));
    }
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
        id(kind, value)?;
        if !seen.insert(value.as_str()) {
            return Err(OrgError::invalid_input(format!("duplicate {} ID: {}", kind, value)));
        }
    }
    Ok(())
}

/// A non-empty batch of distinct members with known roles.
pub(crate) fn members(members: &[Member]) -> OrgResult<()> {
    if members.is_empty() {
        return Err(OrgError::invalid_input("at least one member is required"));
    }
    let mut seen = HashSet::with_capacity(members.len());
    for member in members {
        id("member", &member.id)?;
        if !roles::is_known(&member.role) {
            return Err(OrgError::invalid_input(format!(
                "unknown role for member {}: {:?}",
                member.id, member.role
            )));
        }
        if !seen.insert(member.id.as_str()) {
            return Err(OrgError::invalid_input(format!("duplicate member ID: {}", member.id)));
        }
    }
    Ok(())
}

/// The page request to send to a store: the default limit filled in and the
/// maximum enforced.
pub(crate) fn page(request: &PageMetadata, config: &ServiceConfig) -> OrgResult<PageMetadata> {
    let limit = request.limit.unwrap_or(config.default_limit);
    if limit > config.max_limit {
        return Err(OrgError::invalid_input(format!(
            "limit {} exceeds maximum {}",
            limit, config.max_limit
        )));
    }
    Ok(PageMetadata {
        limit: Some(limit),
        total: 0,
        ..request.clone()
    })
}
