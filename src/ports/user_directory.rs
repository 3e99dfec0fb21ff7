//! UserDirectory port - profile lookup against the identity provider.
//!
//! The core receives already-authenticated actor ids; this port is only
//! for resolving the names and email addresses that notification and
//! email content must carry.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// A user profile as the identity collaborator knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Port for looking up user profiles by ID.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a profile by user ID. Returns `None` for unknown users.
    async fn find(&self, id: &UserId) -> Result<Option<UserProfile>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn UserDirectory) {}
    }
}
