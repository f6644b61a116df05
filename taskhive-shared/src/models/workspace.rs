/// Workspace model and database operations
///
/// This module provides the Workspace model. Workspaces are the top-level
/// collaboration entity; users belong to them via the Membership model. Each
/// owner can hold at most one PERSONAL and one PROFESSIONAL workspace, which
/// is enforced by a unique index rather than application logic.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE workspace_type AS ENUM ('personal', 'professional');
///
/// CREATE TABLE workspaces (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     type workspace_type NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     image_url VARCHAR(512),
///     company_name VARCHAR(255),
///     company_size VARCHAR(50),
///     company_domain VARCHAR(255),
///     subscription_ends_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX workspaces_owner_type_key ON workspaces (owner_id, type);
/// ```
///
/// Creation with its OWNER membership is atomic and lives in
/// `crate::store::workspace`; this module is the plain row-level CRUD.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Workspace types
///
/// Stored lowercase in Postgres, serialized uppercase over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workspace_type", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkspaceType {
    /// Single-user workspace; auto-provisioned on first `"personal"` alias use
    Personal,

    /// Team workspace; the only type that accepts member invites
    Professional,
}

impl WorkspaceType {
    /// Converts type to its storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceType::Personal => "personal",
            WorkspaceType::Professional => "professional",
        }
    }
}

impl fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workspace model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique workspace ID
    ///
    /// v4 for explicitly created workspaces; auto-provisioned personal
    /// workspaces use a v5 id derived from the owner's user id.
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// PERSONAL or PROFESSIONAL
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: WorkspaceType,

    /// Owning user
    pub owner_id: Uuid,

    /// Optional logo/avatar URL
    pub image_url: Option<String>,

    /// Company metadata, meaningful for professional workspaces
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub company_domain: Option<String>,

    /// Trial expiry stamp, creation + 14 days for professional workspaces.
    /// Advisory only; nothing enforces it.
    pub subscription_ends_at: Option<DateTime<Utc>>,

    /// When the workspace was created
    pub created_at: DateTime<Utc>,

    /// When the workspace was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspace {
    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// PERSONAL or PROFESSIONAL
    #[serde(rename = "type")]
    pub kind: WorkspaceType,

    /// Optional logo/avatar URL
    pub image_url: Option<String>,

    /// Company metadata
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub company_domain: Option<String>,
}

/// Input for updating an existing workspace
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspace {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New logo/avatar URL
    pub image_url: Option<String>,
}

impl Workspace {
    /// Inserts a workspace row
    ///
    /// Accepts any executor so the store can pair it with the OWNER membership
    /// insert inside one transaction. `id` is caller-supplied to support the
    /// deterministic personal workspace id.
    ///
    /// # Errors
    ///
    /// Returns an error if the (owner_id, type) unique index is violated or
    /// the database connection fails.
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        owner_id: Uuid,
        data: CreateWorkspace,
        subscription_ends_at: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            INSERT INTO workspaces
                (id, name, description, type, owner_id, image_url,
                 company_name, company_size, company_domain, subscription_ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, description, type, owner_id, image_url,
                      company_name, company_size, company_domain,
                      subscription_ends_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.kind)
        .bind(owner_id)
        .bind(data.image_url)
        .bind(data.company_name)
        .bind(data.company_size)
        .bind(data.company_domain)
        .bind(subscription_ends_at)
        .fetch_one(executor)
        .await?;

        Ok(workspace)
    }

    /// Finds a workspace by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT id, name, description, type, owner_id, image_url,
                   company_name, company_size, company_domain,
                   subscription_ends_at, created_at, updated_at
            FROM workspaces
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(workspace)
    }

    /// Finds the workspace of a given type owned by a user
    ///
    /// At most one row can match thanks to the (owner_id, type) unique index.
    pub async fn find_by_owner_and_type(
        pool: &PgPool,
        owner_id: Uuid,
        kind: WorkspaceType,
    ) -> Result<Option<Self>, sqlx::Error> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT id, name, description, type, owner_id, image_url,
                   company_name, company_size, company_domain,
                   subscription_ends_at, created_at, updated_at
            FROM workspaces
            WHERE owner_id = $1 AND type = $2
            "#,
        )
        .bind(owner_id)
        .bind(kind)
        .fetch_optional(pool)
        .await?;

        Ok(workspace)
    }

    /// Lists all workspaces where the user holds any membership, newest first
    pub async fn list_for_member(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let workspaces = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT w.id, w.name, w.description, w.type, w.owner_id, w.image_url,
                   w.company_name, w.company_size, w.company_domain,
                   w.subscription_ends_at, w.created_at, w.updated_at
            FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE m.user_id = $1
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(workspaces)
    }

    /// Updates an existing workspace
    ///
    /// Only non-None fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated workspace if found, None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateWorkspace,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE workspaces SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, description, type, owner_id, image_url, \
             company_name, company_size, company_domain, subscription_ends_at, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Workspace>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }

        let workspace = q.fetch_optional(pool).await?;

        Ok(workspace)
    }

    /// Deletes a workspace by ID
    ///
    /// Cascades to memberships and tasks through foreign keys.
    ///
    /// # Returns
    ///
    /// True if the workspace was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_type_as_str() {
        assert_eq!(WorkspaceType::Personal.as_str(), "personal");
        assert_eq!(WorkspaceType::Professional.as_str(), "professional");
    }

    #[test]
    fn test_workspace_type_wire_format_is_uppercase() {
        assert_eq!(
            serde_json::to_string(&WorkspaceType::Professional).unwrap(),
            "\"PROFESSIONAL\""
        );
        let parsed: WorkspaceType = serde_json::from_str("\"PERSONAL\"").unwrap();
        assert_eq!(parsed, WorkspaceType::Personal);
    }

    #[test]
    fn test_update_workspace_default_is_noop() {
        let update = UpdateWorkspace::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.image_url.is_none());
    }
}
