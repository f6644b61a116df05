/// Tag model and database operations
///
/// Tags are a flat, globally named set attached to tasks through the
/// `task_tags` join table. Attachment itself lives on the Task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Tag model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique tag ID
    pub id: Uuid,

    /// Tag name (unique)
    pub name: String,

    /// When the tag was created
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Creates a new tag
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(tag)
    }

    /// Lists all tags, alphabetically
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_at
            FROM tags
            ORDER BY name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}
