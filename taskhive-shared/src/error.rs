/// Domain error taxonomy shared by the ledger and stores
///
/// Every fallible ledger/store operation returns `Result<_, DomainError>`.
/// The API crate owns the mapping to HTTP statuses; nothing in here knows
/// about the wire.

use thiserror::Error;

use crate::models::workspace::WorkspaceType;

/// Errors produced by ledger and store operations
#[derive(Debug, Error)]
pub enum DomainError {
    /// Resource doesn't exist, or the actor isn't allowed to know it exists.
    /// Non-membership and absence are deliberately indistinguishable.
    #[error("resource not found")]
    NotFound,

    /// Actor lacks the role required for this operation
    #[error("insufficient permissions")]
    Forbidden,

    /// The OWNER membership can never be modified or removed
    #[error("cannot modify or remove the workspace owner")]
    ImmutableOwner,

    /// An ADMIN tried to act on another ADMIN
    #[error("admins cannot modify other admins")]
    InsufficientRank,

    /// The owner already holds a workspace of this type
    #[error("a {0} workspace already exists for this user")]
    DuplicateWorkspaceType(WorkspaceType),

    /// Members can only be invited to professional workspaces
    #[error("members can only be added to professional workspaces")]
    InvalidWorkspaceType,

    /// The user already holds a membership in this workspace
    #[error("user is already a member of this workspace")]
    AlreadyMember,

    /// A referenced workspace doesn't exist
    #[error("workspace not found")]
    WorkspaceNotFound,

    /// Storage failure; surfaced to clients as a generic internal error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DomainError {
    /// Maps the membership unique-constraint violation to `AlreadyMember`
    ///
    /// Concurrent invites race to the unique (workspace_id, user_id) index;
    /// the loser's constraint violation is the same condition as a
    /// pre-checked duplicate and gets the same error.
    pub fn from_membership_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DomainError::AlreadyMember;
            }
        }
        DomainError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_workspace_type_names_the_type() {
        let err = DomainError::DuplicateWorkspaceType(WorkspaceType::Personal);
        assert_eq!(
            err.to_string(),
            "a personal workspace already exists for this user"
        );
    }
}
