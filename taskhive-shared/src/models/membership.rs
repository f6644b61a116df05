/// Workspace membership model and database operations
///
/// This module provides the Membership model for user-workspace relationships
/// with role-based access. It implements a many-to-many relationship between
/// users and workspaces; the role mutation rules themselves live in
/// `crate::ledger`.
///
/// # Schema
///
/// ```sql
/// -- Declared owner-first so ORDER BY role yields OWNER, ADMIN, MEMBER, GUEST.
/// CREATE TYPE member_role AS ENUM ('owner', 'admin', 'member', 'guest');
///
/// CREATE TABLE workspace_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (workspace_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **OWNER**: exactly one per workspace, created with it, immutable
/// - **ADMIN**: can manage members, except other admins and the owner
/// - **MEMBER**: regular collaborator
/// - **GUEST**: limited collaborator; not ranked against MEMBER
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::membership::{Membership, CreateMembership, MemberRole};
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let workspace_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
///
/// let membership = Membership::create(&pool, CreateMembership {
///     workspace_id,
///     user_id,
///     role: MemberRole::Member,
/// }).await?;
///
/// let has_access = Membership::has_access(&pool, workspace_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Membership roles within a workspace
///
/// Stored lowercase in Postgres, serialized uppercase over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    /// Workspace creator; the owner membership can never be modified or removed
    Owner,

    /// Can manage members (invite, change roles, remove), bounded by the ledger rules
    Admin,

    /// Regular collaborator
    Member,

    /// Limited collaborator; deliberately not ranked against Member
    Guest,
}

impl MemberRole {
    /// Converts role to its storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Guest => "guest",
        }
    }

    /// Whether this role may attempt member mutations at all
    ///
    /// This is only the first gate; `crate::ledger::mutation_decision` applies
    /// the target-role gates on top.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

/// Roles that can be granted through invites and role changes
///
/// OWNER is deliberately absent: ownership is assigned at workspace creation
/// and never through the membership endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignableRole {
    Admin,
    Member,
    Guest,
}

impl AssignableRole {
    /// Widens into the full role enum for storage
    pub fn as_role(&self) -> MemberRole {
        match self {
            AssignableRole::Admin => MemberRole::Admin,
            AssignableRole::Member => MemberRole::Member,
            AssignableRole::Guest => MemberRole::Guest,
        }
    }
}

impl Default for AssignableRole {
    fn default() -> Self {
        AssignableRole::Member
    }
}

/// Membership row linking a user to a workspace with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Membership ID
    pub id: Uuid,

    /// Workspace ID
    pub workspace_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the workspace
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Membership joined with the member's user profile, for listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MembershipWithUser {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: String,
    pub image_url: Option<String>,
    pub job_title: Option<String>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Workspace ID
    pub workspace_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign
    pub role: MemberRole,
}

impl Membership {
    /// Creates a new membership (adds user to workspace)
    ///
    /// Accepts any executor so it can participate in transactions, e.g. the
    /// atomic workspace-plus-owner creation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (unique constraint on workspace_id, user_id)
    /// - Workspace or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, workspace_id, user_id, role, created_at
            "#,
        )
        .bind(data.workspace_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by workspace and user
    pub async fn find(
        pool: &PgPool,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, workspace_id, user_id, role, created_at
            FROM workspace_members
            WHERE workspace_id = $1 AND user_id = $2
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a membership by its own ID, scoped to a workspace
    ///
    /// The workspace scoping matters: a membership ID from another workspace
    /// must behave as if it doesn't exist.
    pub async fn find_in_workspace(
        pool: &PgPool,
        workspace_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, workspace_id, user_id, role, created_at
            FROM workspace_members
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id)
        .bind(membership_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Checks if a user has access to a workspace (any role)
    pub async fn has_access(
        pool: &PgPool,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM workspace_members
                WHERE workspace_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Gets a user's role in a workspace
    ///
    /// # Returns
    ///
    /// The user's role if they are a member, None otherwise
    pub async fn get_role(
        pool: &PgPool,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MemberRole>, sqlx::Error> {
        let role: Option<MemberRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM workspace_members
            WHERE workspace_id = $1 AND user_id = $2
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Updates a membership's role by membership ID
    ///
    /// # Returns
    ///
    /// The updated membership if found, None if it doesn't exist
    pub async fn update_role(
        pool: &PgPool,
        membership_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE workspace_members
            SET role = $2
            WHERE id = $1
            RETURNING id, workspace_id, user_id, role, created_at
            "#,
        )
        .bind(membership_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Deletes a membership by ID (removes the member from the workspace)
    ///
    /// # Returns
    ///
    /// True if a membership was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, membership_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workspace_members WHERE id = $1")
            .bind(membership_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a workspace with their user profiles
    ///
    /// Ordered by role (OWNER first, per the enum declaration order), then by
    /// join date. This ordering is part of the API display contract.
    pub async fn list_with_users(
        pool: &PgPool,
        workspace_id: Uuid,
    ) -> Result<Vec<MembershipWithUser>, sqlx::Error> {
        let members = sqlx::query_as::<_, MembershipWithUser>(
            r#"
            SELECT m.id, m.workspace_id, m.user_id, m.role, m.created_at,
                   u.name, u.email, u.image_url, u.job_title
            FROM workspace_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.workspace_id = $1
            ORDER BY m.role ASC, m.created_at ASC
            "#,
        )
        .bind(workspace_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert_eq!(MemberRole::Guest.as_str(), "guest");
    }

    #[test]
    fn test_can_manage_members() {
        assert!(MemberRole::Owner.can_manage_members());
        assert!(MemberRole::Admin.can_manage_members());
        assert!(!MemberRole::Member.can_manage_members());
        assert!(!MemberRole::Guest.can_manage_members());
    }

    #[test]
    fn test_assignable_role_never_owner() {
        for role in [
            AssignableRole::Admin,
            AssignableRole::Member,
            AssignableRole::Guest,
        ] {
            assert_ne!(role.as_role(), MemberRole::Owner);
        }
    }

    #[test]
    fn test_assignable_role_default() {
        assert_eq!(AssignableRole::default(), AssignableRole::Member);
    }

    #[test]
    fn test_role_wire_format_is_uppercase() {
        assert_eq!(
            serde_json::to_string(&MemberRole::Owner).unwrap(),
            "\"OWNER\""
        );
        let parsed: AssignableRole = serde_json::from_str("\"GUEST\"").unwrap();
        assert_eq!(parsed, AssignableRole::Guest);
    }

    // Integration tests for database operations are in taskhive-api/tests/.
}
