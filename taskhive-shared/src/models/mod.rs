/// Database models for Taskhive
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts mapped from the external identity provider
/// - `workspace`: Personal/professional workspaces
/// - `membership`: User-workspace relationships with roles
/// - `task`: User-scoped tasks with priority, due date, and tags
/// - `tag`: Flat tag directory for tasks
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::workspace::Workspace;
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let workspaces = Workspace::list_for_member(&pool, Uuid::new_v4()).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod tag;
pub mod task;
pub mod user;
pub mod workspace;
