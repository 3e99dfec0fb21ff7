//! In-memory user directory for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{UserDirectory, UserProfile};

/// User directory backed by a hash map.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a profile, replacing any previous entry for the id.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, profile: UserProfile) {
        self.users
            .write()
            .expect("InMemoryUserDirectory: write lock poisoned")
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: &UserId) -> Result<Option<UserProfile>, DomainError> {
        Ok(self
            .users
            .read()
            .expect("InMemoryUserDirectory: lock poisoned")
            .get(id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_returns_registered_profile() {
        let directory = InMemoryUserDirectory::new();
        let id = UserId::new("student-1").unwrap();
        directory.insert(UserProfile {
            id: id.clone(),
            name: "Dana".to_string(),
            email: "dana@example.edu".to_string(),
        });

        let profile = directory.find(&id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Dana");
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_user() {
        let directory = InMemoryUserDirectory::new();
        let id = UserId::new("ghost").unwrap();
        assert!(directory.find(&id).await.unwrap().is_none());
    }
}
