/// User model and database operations
///
/// Identity is owned by an external provider; this table maps provider
/// subjects to local rows. Rows come into existence two ways:
///
/// - lazily, on the first authenticated touch (profile sync, workspace or
///   task creation), carrying the provider subject in `external_id`;
/// - as placeholders, when someone is invited by email before ever signing
///   in. Placeholders have no `external_id` and get linked to the provider
///   subject on first sign-in by matching email.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     external_id VARCHAR(255),
///     email VARCHAR(255) NOT NULL, -- unique on LOWER(email)
///     username VARCHAR(255) NOT NULL,
///     first_name VARCHAR(255) NOT NULL DEFAULT '',
///     last_name VARCHAR(255) NOT NULL DEFAULT '',
///     name VARCHAR(255),
///     image_url VARCHAR(512),
///     job_title VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::identity::Identity;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Subject ID at the external identity provider; None for invite
    /// placeholders that have never signed in
    pub external_id: Option<String>,

    /// Email address (unique case-insensitively)
    pub email: String,

    /// Handle; defaults to the email local part for placeholders
    pub username: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Display name
    pub name: Option<String>,

    /// Avatar URL
    pub image_url: Option<String>,

    /// Job title
    pub job_title: Option<String>,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub external_id: Option<String>,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// Input for updating a user profile
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub job_title: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// Accepts any executor so invites can create the placeholder user and
    /// the membership inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already taken or the database
    /// connection fails.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, email, username, first_name, last_name, name, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, external_id, email, username, first_name, last_name,
                      name, image_url, job_title, created_at, updated_at
            "#,
        )
        .bind(data.external_id)
        .bind(data.email)
        .bind(data.username)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.name)
        .bind(data.image_url)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by external provider subject
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, username, first_name, last_name,
                   name, image_url, job_title, created_at, updated_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email, case-insensitively
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, email, username, first_name, last_name,
                   name, image_url, job_title, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolves the user row for an authenticated identity, creating or
    /// linking it when needed
    ///
    /// Resolution order:
    ///
    /// 1. a row already linked to this provider subject;
    /// 2. an unlinked placeholder with the same email, which gets linked by
    ///    stamping `external_id` (the invited-then-signed-up flow);
    /// 3. a fresh row built from the identity's claims.
    ///
    /// A concurrent first sign-in of the same subject loses on the unique
    /// email constraint and surfaces as a database error.
    pub async fn find_or_create_from_identity(
        pool: &PgPool,
        identity: &Identity,
    ) -> Result<Self, sqlx::Error> {
        if let Some(user) = Self::find_by_external_id(pool, &identity.subject).await? {
            return Ok(user);
        }

        if let Some(existing) = Self::find_by_email(pool, &identity.email).await? {
            if existing.external_id.is_none() {
                return Self::link_external_id(pool, existing.id, identity).await;
            }
            return Ok(existing);
        }

        Self::create(
            pool,
            CreateUser {
                external_id: Some(identity.subject.clone()),
                email: identity.email.clone(),
                username: identity.username(),
                first_name: identity.first_name.clone().unwrap_or_default(),
                last_name: identity.last_name.clone().unwrap_or_default(),
                name: identity.display_name(),
                image_url: identity.image_url.clone(),
            },
        )
        .await
    }

    /// Stamps the provider subject onto a placeholder row and backfills
    /// profile fields from the identity claims
    async fn link_external_id(
        pool: &PgPool,
        id: Uuid,
        identity: &Identity,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET external_id = $2,
                first_name = COALESCE(NULLIF($3, ''), first_name),
                last_name = COALESCE(NULLIF($4, ''), last_name),
                name = COALESCE($5, name),
                image_url = COALESCE($6, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, external_id, email, username, first_name, last_name,
                      name, image_url, job_title, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&identity.subject)
        .bind(identity.first_name.clone().unwrap_or_default())
        .bind(identity.last_name.clone().unwrap_or_default())
        .bind(identity.display_name())
        .bind(identity.image_url.clone())
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates an unlinked placeholder user for an email invite
    ///
    /// Username defaults to the email local part.
    pub async fn create_placeholder<'e, E>(executor: E, email: &str) -> Result<Self, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let username = email.split('@').next().unwrap_or(email).to_string();

        Self::create(
            executor,
            CreateUser {
                external_id: None,
                email: email.to_string(),
                username,
                first_name: String::new(),
                last_name: String::new(),
                name: None,
                image_url: None,
            },
        )
        .await
    }

    /// Updates a user profile
    ///
    /// Only non-None fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }
        if data.job_title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", job_title = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, external_id, email, username, first_name, \
             last_name, name, image_url, job_title, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(job_title) = data.job_title {
            q = q.bind(job_title);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }
}
