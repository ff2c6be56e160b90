//! PostgreSQL repository implementation
//!
//! Every batch runs in one transaction; an error returns before commit and the
//! transaction is rolled back when dropped. Relation tables reference `orgs`
//! with `ON DELETE CASCADE`, so deleting an organization removes its relations
//! in the same statement.
//!
//! Relation inserts take a `FOR KEY SHARE` lock on the referenced organization
//! row, so a concurrent delete cannot slip between the existence check and the
//! insert.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orgs_model::{
    Backup, GroupRelation, GroupRelationsPage, Member, MemberRelation, MembersPage, Metadata,
    Organization, OrgsPage, PageMetadata,
};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::error::{StoreError, StoreResult};
use crate::repository::{GroupStore, MembershipStore, OrgRepository, OrgStore};

const SCHEMA: [&str; 5] = [
    r#"CREATE TABLE IF NOT EXISTS orgs (
        id          VARCHAR(254) PRIMARY KEY,
        owner_id    VARCHAR(254) NOT NULL,
        name        VARCHAR(254) NOT NULL,
        description VARCHAR(1024) NOT NULL DEFAULT '',
        metadata    JSONB NOT NULL DEFAULT '{}',
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS member_relations (
        org_id     VARCHAR(254) NOT NULL REFERENCES orgs (id) ON DELETE CASCADE,
        member_id  VARCHAR(254) NOT NULL,
        role       VARCHAR(32) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (org_id, member_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS member_relations_member_id_idx ON member_relations (member_id)",
    r#"CREATE TABLE IF NOT EXISTS group_relations (
        group_id   VARCHAR(254) PRIMARY KEY,
        org_id     VARCHAR(254) NOT NULL REFERENCES orgs (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS group_relations_org_id_idx ON group_relations (org_id)",
];

const ORG_COLUMNS: &str = "id, owner_id, name, description, metadata, created_at, updated_at";

/// Connection settings for [`PgOrgRepository`].
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum pool size
    pub max_connections: u32,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost:5432/orgs".to_string(),
            max_connections: 10,
        }
    }
}

impl PgConfig {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `ORGS_DATABASE_URL`: connection URL (default: postgres://localhost:5432/orgs)
    /// - `ORGS_DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: std::env::var("ORGS_DATABASE_URL").unwrap_or(default.database_url),
            max_connections: std::env::var("ORGS_DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_connections),
        }
    }
}

/// PostgreSQL organization repository.
#[derive(Debug, Clone)]
pub struct PgOrgRepository {
    pool: PgPool,
}

enum OrgScope<'a> {
    Owner(&'a str),
    Member(&'a str),
    All,
}

impl PgOrgRepository {
    /// Connect a new pool.
    pub async fn connect(config: &PgConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!(max_connections = config.max_connections, "Connected organization store");
        Ok(Self { pool })
    }

    /// Use an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables and indexes if they do not exist.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn list_orgs(&self, scope: OrgScope<'_>, page: &PageMetadata) -> StoreResult<OrgsPage> {
        let mut count = org_query("SELECT COUNT(*) FROM orgs", &scope, page);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = org_query(&format!("SELECT {} FROM orgs", ORG_COLUMNS), &scope, page);
        select
            .push(" ORDER BY id OFFSET ")
            .push_bind(to_i64(page.offset))
            .push(" LIMIT ")
            .push_bind(page.limit.map(to_i64));
        let rows = select.build().fetch_all(&self.pool).await?;
        let orgs = rows.iter().map(org_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(OrgsPage {
            page: page.echo(total as u64),
            orgs,
        })
    }

    async fn upsert_members(&self, relations: &[MemberRelation]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for relation in relations {
            lock_org(&mut tx, &relation.org_id).await?;
            upsert_member(&mut tx, relation).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrgStore for PgOrgRepository {
    async fn save(&self, orgs: &[Organization]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for org in orgs {
            insert_org(&mut tx, org).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, org: &Organization) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE orgs SET name = $2, description = $3, metadata = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(&org.description)
        .bind(Json(&org.metadata))
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::org_not_found(&org.id));
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM orgs WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::org_not_found(id));
        }
        Ok(())
    }

    async fn retrieve_by_id(&self, id: &str) -> StoreResult<Organization> {
        let row = sqlx::query(&format!("SELECT {} FROM orgs WHERE id = $1", ORG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(org_from_row(&row)?),
            None => Err(StoreError::org_not_found(id)),
        }
    }

    async fn retrieve_by_owner(
        &self,
        owner_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<OrgsPage> {
        self.list_orgs(OrgScope::Owner(owner_id), page).await
    }

    async fn retrieve_memberships(
        &self,
        member_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<OrgsPage> {
        self.list_orgs(OrgScope::Member(member_id), page).await
    }

    async fn retrieve_all(&self) -> StoreResult<Vec<Organization>> {
        let rows = sqlx::query(&format!("SELECT {} FROM orgs ORDER BY id", ORG_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(org_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn retrieve_by_admin(&self, page: &PageMetadata) -> StoreResult<OrgsPage> {
        self.list_orgs(OrgScope::All, page).await
    }
}

#[async_trait]
impl MembershipStore for PgOrgRepository {
    async fn assign_members(&self, relations: &[MemberRelation]) -> StoreResult<()> {
        self.upsert_members(relations).await
    }

    async fn unassign_members(&self, org_id: &str, member_ids: &[String]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_org(&mut tx, org_id).await?;
        for member_id in distinct(member_ids) {
            let result =
                sqlx::query("DELETE FROM member_relations WHERE org_id = $1 AND member_id = $2")
                    .bind(org_id)
                    .bind(member_id)
                    .execute(&mut *tx)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::member_not_found(org_id, member_id));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_members(&self, relations: &[MemberRelation]) -> StoreResult<()> {
        self.upsert_members(relations).await
    }

    async fn retrieve_role(&self, member_id: &str, org_id: &str) -> StoreResult<String> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM member_relations WHERE org_id = $1 AND member_id = $2",
        )
        .bind(org_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        role.ok_or_else(|| StoreError::member_not_found(org_id, member_id))
    }

    async fn retrieve_members(
        &self,
        org_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<MembersPage> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM member_relations WHERE org_id = $1")
                .bind(org_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT member_id, role FROM member_relations WHERE org_id = $1 \
             ORDER BY member_id OFFSET $2 LIMIT $3",
        )
        .bind(org_id)
        .bind(to_i64(page.offset))
        .bind(page.limit.map(to_i64))
        .fetch_all(&self.pool)
        .await?;

        let members = rows
            .iter()
            .map(|row| -> Result<Member, sqlx::Error> {
                Ok(Member::new(
                    row.try_get::<String, _>("member_id")?,
                    row.try_get::<String, _>("role")?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MembersPage {
            page: page.echo(total as u64),
            members,
        })
    }

    async fn retrieve_all_member_relations(&self) -> StoreResult<Vec<MemberRelation>> {
        let rows = sqlx::query(
            "SELECT org_id, member_id, role, created_at, updated_at FROM member_relations \
             ORDER BY org_id, member_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(member_relation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl GroupStore for PgOrgRepository {
    async fn assign_groups(&self, relations: &[GroupRelation]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for relation in relations {
            lock_org(&mut tx, &relation.org_id).await?;
            upsert_group(&mut tx, relation).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn unassign_groups(&self, org_id: &str, group_ids: &[String]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_org(&mut tx, org_id).await?;
        for group_id in distinct(group_ids) {
            let result =
                sqlx::query("DELETE FROM group_relations WHERE org_id = $1 AND group_id = $2")
                    .bind(org_id)
                    .bind(group_id)
                    .execute(&mut *tx)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::group_not_found(group_id));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn retrieve_groups(
        &self,
        org_id: &str,
        page: &PageMetadata,
    ) -> StoreResult<GroupRelationsPage> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM group_relations WHERE org_id = $1")
                .bind(org_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT org_id, group_id, created_at, updated_at FROM group_relations \
             WHERE org_id = $1 ORDER BY group_id OFFSET $2 LIMIT $3",
        )
        .bind(org_id)
        .bind(to_i64(page.offset))
        .bind(page.limit.map(to_i64))
        .fetch_all(&self.pool)
        .await?;

        let group_relations = rows
            .iter()
            .map(group_relation_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GroupRelationsPage {
            page: page.echo(total as u64),
            group_relations,
        })
    }

    async fn retrieve_by_group_id(&self, group_id: &str) -> StoreResult<Organization> {
        let row = sqlx::query(
            "SELECT o.id, o.owner_id, o.name, o.description, o.metadata, o.created_at, o.updated_at \
             FROM orgs o JOIN group_relations g ON g.org_id = o.id WHERE g.group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(org_from_row(&row)?),
            None => Err(StoreError::group_not_found(group_id)),
        }
    }

    async fn retrieve_all_group_relations(&self) -> StoreResult<Vec<GroupRelation>> {
        let rows = sqlx::query(
            "SELECT org_id, group_id, created_at, updated_at FROM group_relations ORDER BY group_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(group_relation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl OrgRepository for PgOrgRepository {
    async fn restore(&self, backup: &Backup) -> StoreResult<()> {
        backup.validate()?;

        let mut tx = self.pool.begin().await?;
        for org in &backup.orgs {
            insert_org(&mut tx, org).await?;
        }
        for relation in &backup.member_relations {
            lock_org(&mut tx, &relation.org_id).await?;
            upsert_member(&mut tx, relation).await?;
        }
        for relation in &backup.group_relations {
            lock_org(&mut tx, &relation.org_id).await?;
            upsert_group(&mut tx, relation).await?;
        }
        tx.commit().await?;

        tracing::info!(
            orgs = backup.orgs.len(),
            member_relations = backup.member_relations.len(),
            group_relations = backup.group_relations.len(),
            "Restored snapshot"
        );
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<Backup> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let orgs = sqlx::query(&format!("SELECT {} FROM orgs ORDER BY id", ORG_COLUMNS))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(org_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let member_relations = sqlx::query(
            "SELECT org_id, member_id, role, created_at, updated_at FROM member_relations \
             ORDER BY org_id, member_id",
        )
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(member_relation_from_row)
        .collect::<Result<Vec<_>, _>>()?;
        let group_relations = sqlx::query(
            "SELECT org_id, group_id, created_at, updated_at FROM group_relations ORDER BY group_id",
        )
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(group_relation_from_row)
        .collect::<Result<Vec<_>, _>>()?;
        tx.commit().await?;

        Ok(Backup::new(orgs, member_relations, group_relations))
    }
}

async fn insert_org(conn: &mut PgConnection, org: &Organization) -> StoreResult<()> {
    let result = sqlx::query(&format!(
        "INSERT INTO orgs ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO NOTHING",
        ORG_COLUMNS
    ))
    .bind(&org.id)
    .bind(&org.owner_id)
    .bind(&org.name)
    .bind(&org.description)
    .bind(Json(&org.metadata))
    .bind(org.created_at)
    .bind(org.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::org_conflict(&org.id));
    }
    Ok(())
}

/// Fail with `OrgNotFound` unless the organization exists; the row stays
/// locked against deletion until the transaction ends.
async fn lock_org(conn: &mut PgConnection, org_id: &str) -> StoreResult<()> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM orgs WHERE id = $1 FOR KEY SHARE")
        .bind(org_id)
        .fetch_optional(&mut *conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::org_not_found(org_id)),
    }
}

async fn upsert_member(conn: &mut PgConnection, relation: &MemberRelation) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO member_relations (org_id, member_id, role, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (org_id, member_id) \
         DO UPDATE SET role = EXCLUDED.role, updated_at = EXCLUDED.updated_at",
    )
    .bind(&relation.org_id)
    .bind(&relation.member_id)
    .bind(&relation.role)
    .bind(relation.created_at)
    .bind(relation.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_group(conn: &mut PgConnection, relation: &GroupRelation) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO group_relations (group_id, org_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (group_id) DO UPDATE SET \
           created_at = CASE WHEN group_relations.org_id = EXCLUDED.org_id \
                             THEN group_relations.created_at ELSE EXCLUDED.created_at END, \
           org_id = EXCLUDED.org_id, \
           updated_at = EXCLUDED.updated_at",
    )
    .bind(&relation.group_id)
    .bind(&relation.org_id)
    .bind(relation.created_at)
    .bind(relation.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn org_query(select: &str, scope: &OrgScope<'_>, page: &PageMetadata) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE TRUE");

    match scope {
        OrgScope::Owner(owner_id) => {
            qb.push(" AND owner_id = ").push_bind(owner_id.to_string());
        }
        OrgScope::Member(member_id) => {
            qb.push(" AND id IN (SELECT org_id FROM member_relations WHERE member_id = ")
                .push_bind(member_id.to_string())
                .push(")");
        }
        OrgScope::All => {}
    }

    if let Some(name) = page.name.as_deref().filter(|n| !n.is_empty()) {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }
    if let Some(metadata) = &page.metadata {
        qb.push(" AND metadata @> ").push_bind(Json(metadata.clone()));
    }

    qb
}

/// Escape `LIKE` wildcards so the name filter is a literal substring match.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ids` without repeats, in first-seen order.
fn distinct(ids: &[String]) -> Vec<&String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(id.as_str())).collect()
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn org_from_row(row: &PgRow) -> Result<Organization, sqlx::Error> {
    let Json(metadata): Json<Metadata> = row.try_get("metadata")?;
    Ok(Organization {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        metadata,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn member_relation_from_row(row: &PgRow) -> Result<MemberRelation, sqlx::Error> {
    Ok(MemberRelation {
        org_id: row.try_get("org_id")?,
        member_id: row.try_get("member_id")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn group_relation_from_row(row: &PgRow) -> Result<GroupRelation, sqlx::Error> {
    Ok(GroupRelation {
        org_id: row.try_get("org_id")?,
        group_id: row.try_get("group_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
