//! Store contract tests against the in-memory repository.
//!
//! Covered:
//! 1. Uniqueness and ownership isolation
//! 2. Upserts and the referential guard
//! 3. Pagination totals and weak consistency under concurrent writes
//! 4. Concurrent writers on one key and snapshots under churn
//! 5. Backup/restore round-trip
//! 6. Membership and group reassignment scenarios

use std::collections::HashSet;
use std::sync::Arc;

use orgs_model::{
    roles, Backup, GroupRelation, MemberRelation, Metadata, Organization, PageMetadata,
};
use orgs_store::{GroupStore, MembershipStore, MemoryOrgRepository, OrgRepository, OrgStore, StoreError};
use serde_json::json;

fn org(id: &str, owner: &str) -> Organization {
    Organization::new(id, owner, format!("org {}", id))
}

async fn snapshot(repo: &MemoryOrgRepository) -> Backup {
    repo.snapshot().await.unwrap()
}

// ============================================================================
// Uniqueness and ownership
// ============================================================================

#[tokio::test]
async fn test_save_conflict_leaves_existing_orgs() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a"), org("o2", "a")]).await.unwrap();

    let err = repo.save(&[org("o1", "b")]).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref id, .. } if id == "o1"));

    assert_eq!(repo.retrieve_by_id("o1").await.unwrap().owner_id, "a");
    assert!(repo.retrieve_by_id("o2").await.is_ok());
}

#[tokio::test]
async fn test_delete_by_non_owner_is_not_found() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "b")]).await.unwrap();

    let err = repo.delete("a", "o1").await.unwrap_err();
    assert_eq!(err, StoreError::org_not_found("o1"));
    assert!(repo.retrieve_by_id("o1").await.is_ok());
}

// ============================================================================
// Membership
// ============================================================================

#[tokio::test]
async fn test_reassign_overwrites_role() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a")]).await.unwrap();

    repo.assign_members(&[MemberRelation::new("o1", "p2", roles::VIEWER)])
        .await
        .unwrap();
    repo.assign_members(&[MemberRelation::new("o1", "p2", roles::EDITOR)])
        .await
        .unwrap();

    let page = repo
        .retrieve_members("o1", &PageMetadata::unbounded())
        .await
        .unwrap();
    assert_eq!(page.page.total, 1);
    assert_eq!(page.members[0].role, roles::EDITOR);
}

#[tokio::test]
async fn test_assign_to_missing_org_creates_nothing() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a")]).await.unwrap();

    let err = repo
        .assign_members(&[
            MemberRelation::new("o1", "p2", roles::MEMBER),
            MemberRelation::new("missing", "p2", roles::MEMBER),
        ])
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::org_not_found("missing"));
    assert!(repo.retrieve_all_member_relations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_member_lifecycle() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "p1")]).await.unwrap();

    repo.assign_members(&[MemberRelation::new("o1", "p2", roles::MEMBER)])
        .await
        .unwrap();
    assert_eq!(repo.retrieve_role("p2", "o1").await.unwrap(), roles::MEMBER);

    repo.unassign_members("o1", &["p2".to_string()]).await.unwrap();
    assert_eq!(
        repo.retrieve_role("p2", "o1").await.unwrap_err(),
        StoreError::member_not_found("o1", "p2")
    );
}

#[tokio::test]
async fn test_unassign_with_repeated_ids() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a")]).await.unwrap();
    repo.assign_members(&[
        MemberRelation::new("o1", "p2", roles::MEMBER),
        MemberRelation::new("o1", "p3", roles::MEMBER),
    ])
    .await
    .unwrap();
    repo.assign_groups(&[GroupRelation::new("o1", "g1")]).await.unwrap();

    repo.unassign_members("o1", &["p2".to_string(), "p2".to_string()])
        .await
        .unwrap();
    repo.unassign_groups("o1", &["g1".to_string(), "g1".to_string()])
        .await
        .unwrap();

    let page = repo
        .retrieve_members("o1", &PageMetadata::unbounded())
        .await
        .unwrap();
    assert_eq!(page.page.total, 1);
    assert_eq!(page.members[0].id, "p3");
    assert!(repo.retrieve_by_group_id("g1").await.is_err());
}

#[tokio::test]
async fn test_memberships_honor_filters() {
    let repo = MemoryOrgRepository::new();
    let mut tagged = Metadata::new();
    tagged.insert("tier", "gold");

    repo.save(&[
        Organization::new("o1", "a", "Acme").with_metadata(tagged.clone()),
        Organization::new("o2", "a", "Acme Labs"),
        Organization::new("o3", "a", "Globex").with_metadata(tagged.clone()),
    ])
    .await
    .unwrap();
    for id in ["o1", "o2", "o3"] {
        repo.assign_members(&[MemberRelation::new(id, "p2", roles::VIEWER)])
            .await
            .unwrap();
    }

    let by_name = repo
        .retrieve_memberships("p2", &PageMetadata::unbounded().with_name("ACME"))
        .await
        .unwrap();
    assert_eq!(by_name.page.total, 2);

    let filter = Metadata::from_value(json!({"tier": "gold"})).unwrap();
    let by_meta = repo
        .retrieve_memberships("p2", &PageMetadata::unbounded().with_metadata(filter))
        .await
        .unwrap();
    let ids: Vec<&str> = by_meta.orgs.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["o1", "o3"]);
}

// ============================================================================
// Groups
// ============================================================================

#[tokio::test]
async fn test_group_moves_between_orgs() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a"), org("o2", "a")]).await.unwrap();

    repo.assign_groups(&[GroupRelation::new("o1", "g1")]).await.unwrap();
    assert_eq!(repo.retrieve_by_group_id("g1").await.unwrap().id, "o1");

    repo.assign_groups(&[GroupRelation::new("o2", "g1")]).await.unwrap();
    assert_eq!(repo.retrieve_by_group_id("g1").await.unwrap().id, "o2");

    let o1 = repo
        .retrieve_groups("o1", &PageMetadata::unbounded())
        .await
        .unwrap();
    assert!(o1.group_relations.is_empty());
    assert_eq!(o1.page.total, 0);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_page_total_counts_all_matches() {
    let repo = MemoryOrgRepository::new();
    let n = 6;
    let orgs: Vec<Organization> = (0..n).map(|i| org(&format!("o{}", i), "a")).collect();
    repo.save(&orgs).await.unwrap();

    let page = repo
        .retrieve_by_owner("a", &PageMetadata::new(0, n - 1))
        .await
        .unwrap();
    assert_eq!(page.orgs.len() as u64, n - 1);
    assert_eq!(page.page.total, n);

    let rest = repo
        .retrieve_by_owner("a", &PageMetadata::new(n - 1, n))
        .await
        .unwrap();
    assert_eq!(rest.orgs.len(), 1);
}

#[tokio::test]
async fn test_zero_limit_reports_total_only() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a"), org("o2", "a")]).await.unwrap();

    let page = repo.retrieve_by_admin(&PageMetadata::new(0, 0)).await.unwrap();
    assert!(page.orgs.is_empty());
    assert_eq!(page.page.total, 2);
}

/// Offset pages are not snapshot-consistent: an insert ahead of the cursor
/// between two page requests shifts an item onto the next page.
#[tokio::test]
async fn test_paging_under_concurrent_insert_may_duplicate() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o2", "a"), org("o4", "a"), org("o6", "a")])
        .await
        .unwrap();

    let first = repo
        .retrieve_by_owner("a", &PageMetadata::new(0, 2))
        .await
        .unwrap();
    repo.save(&[org("o1", "a")]).await.unwrap();
    let second = repo
        .retrieve_by_owner("a", &PageMetadata::new(2, 2))
        .await
        .unwrap();

    let first_ids: Vec<&str> = first.orgs.iter().map(|o| o.id.as_str()).collect();
    let second_ids: Vec<&str> = second.orgs.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(first_ids, vec!["o2", "o4"]);
    assert_eq!(second_ids, vec!["o4", "o6"]);
    assert_eq!(second.page.total, 4);
}

/// A delete behind the cursor shifts an item onto the previous page, so it is
/// skipped.
#[tokio::test]
async fn test_paging_under_concurrent_delete_may_skip() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a"), org("o2", "a"), org("o3", "a"), org("o4", "a")])
        .await
        .unwrap();

    let first = repo
        .retrieve_by_owner("a", &PageMetadata::new(0, 2))
        .await
        .unwrap();
    repo.delete("a", "o1").await.unwrap();
    let second = repo
        .retrieve_by_owner("a", &PageMetadata::new(2, 2))
        .await
        .unwrap();

    let seen: HashSet<String> = first
        .orgs
        .into_iter()
        .chain(second.orgs)
        .map(|o| o.id)
        .collect();
    assert!(!seen.contains("o3"));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_keep_one_relation() {
    let repo = Arc::new(MemoryOrgRepository::new());
    repo.save(&[org("o1", "a")]).await.unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let repo = repo.clone();
            let role = if i % 2 == 0 { roles::VIEWER } else { roles::EDITOR };
            tokio::spawn(async move {
                repo.assign_members(&[MemberRelation::new("o1", "p2", role)])
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let relations = repo.retrieve_all_member_relations().await.unwrap();
    assert_eq!(relations.len(), 1);
    assert!(relations[0].role == roles::VIEWER || relations[0].role == roles::EDITOR);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_of_one_id_admit_one() {
    let repo = Arc::new(MemoryOrgRepository::new());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.save(&[org("o1", &format!("owner{}", i))]).await })
        })
        .collect();

    let mut admitted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(err) => assert!(matches!(err, StoreError::Conflict { .. })),
        }
    }
    assert_eq!(admitted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshot_under_churn_is_restorable() {
    let repo = Arc::new(MemoryOrgRepository::new());

    let writer = {
        let repo = repo.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let id = format!("o{}", i % 4);
                let _ = repo.delete("a", &id).await;
                repo.save(&[org(&id, "a")]).await.unwrap();
                repo.assign_members(&[MemberRelation::new(&id, "p2", roles::MEMBER)])
                    .await
                    .unwrap();
                repo.assign_groups(&[GroupRelation::new(&id, &format!("g{}", i % 3))])
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..50 {
        let backup = repo.snapshot().await.unwrap();
        backup.validate().unwrap();
        MemoryOrgRepository::new().restore(&backup).await.unwrap();
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
}

// ============================================================================
// Backup / restore
// ============================================================================

#[tokio::test]
async fn test_restore_of_backup_reproduces_state() {
    let source = MemoryOrgRepository::new();
    source.save(&[org("o1", "a"), org("o2", "b")]).await.unwrap();
    source
        .assign_members(&[
            MemberRelation::new("o1", "p2", roles::ADMIN),
            MemberRelation::new("o2", "p2", roles::VIEWER),
            MemberRelation::new("o2", "p3", roles::MEMBER),
        ])
        .await
        .unwrap();
    source
        .assign_groups(&[GroupRelation::new("o1", "g1"), GroupRelation::new("o2", "g2")])
        .await
        .unwrap();

    let backup = snapshot(&source).await;

    let target = MemoryOrgRepository::new();
    target.restore(&backup).await.unwrap();

    assert_eq!(snapshot(&target).await, backup);
    assert_eq!(target.retrieve_role("p2", "o1").await.unwrap(), roles::ADMIN);
    assert_eq!(target.retrieve_by_group_id("g2").await.unwrap().id, "o2");
}

#[tokio::test]
async fn test_restore_into_populated_store_conflicts() {
    let repo = MemoryOrgRepository::new();
    repo.save(&[org("o1", "a")]).await.unwrap();

    let backup = Backup::new(
        vec![org("o0", "a"), org("o1", "a")],
        vec![MemberRelation::new("o0", "p2", roles::MEMBER)],
        vec![],
    );
    let err = repo.restore(&backup).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref id, .. } if id == "o1"));

    assert!(repo.retrieve_by_id("o0").await.is_err());
    assert!(repo.retrieve_all_member_relations().await.unwrap().is_empty());
}
