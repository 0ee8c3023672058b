use std::sync::Arc;

use crate::auth::repo_types::User;
use crate::store::{Change, Collection, JsonStore, StoreError};

pub const USERS_DOCUMENT: &str = "users";

/// Users collection backed by `users.json`.
pub struct UserRepo {
    docs: Collection<Vec<User>>,
}

impl UserRepo {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            docs: Collection::new(store, USERS_DOCUMENT),
        }
    }

    pub async fn reload(&self) -> Vec<User> {
        self.docs.reload().await
    }

    /// Find a user by exact (case-sensitive) email.
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.reload().await.into_iter().find(|u| u.email == email)
    }

    /// Append `user` unless its email is already registered.
    ///
    /// Returns `false` on a duplicate email; nothing is written in that case.
    pub async fn insert(&self, user: User) -> Result<bool, StoreError> {
        self.docs
            .update(|users| {
                if users.iter().any(|u| u.email == user.email) {
                    return Change::Keep(false);
                }
                users.push(user);
                Change::Write(true)
            })
            .await
    }

    /// Replace the record with the same id or email, or append a new one.
    ///
    /// Request paths go through [`insert`](Self::insert) and
    /// [`update_by_email`](Self::update_by_email), which decide under the lock.
    #[cfg(test)]
    pub async fn upsert(&self, user: User) -> Result<(), StoreError> {
        self.docs
            .update(|users| {
                match users.iter_mut().find(|u| {
                    u.email == user.email || (!user.id.is_empty() && u.id == user.id)
                }) {
                    Some(existing) => *existing = user,
                    None => users.push(user),
                }
                Change::Write(())
            })
            .await
    }

    /// Apply `f` to the user with `email` and persist. `None` if no such user.
    pub async fn update_by_email(
        &self,
        email: &str,
        f: impl FnOnce(&mut User),
    ) -> Result<Option<User>, StoreError> {
        self.docs
            .update(|users| match users.iter_mut().find(|u| u.email == email) {
                Some(user) => {
                    f(user);
                    Change::Write(Some(user.clone()))
                }
                None => Change::Keep(None),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: "Ada".into(),
            email: email.into(),
            password: "hash".into(),
            security_question: None,
            security_answer: None,
            created_at: datetime!(2024-03-01 09:00:00 UTC),
            last_login: None,
            updated_at: None,
        }
    }

    fn repo(dir: &TempDir) -> UserRepo {
        UserRepo::new(Arc::new(JsonStore::new(dir.path())))
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let dir = TempDir::new().unwrap();
        let users = repo(&dir);

        assert!(users.insert(user("1", "ada@example.com")).await.unwrap());
        assert!(!users.insert(user("2", "ada@example.com")).await.unwrap());
        assert_eq!(users.reload().await.len(), 1);
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let users = repo(&dir);
        users.insert(user("1", "Ada@example.com")).await.unwrap();

        assert!(users.find_by_email("Ada@example.com").await.is_some());
        assert!(users.find_by_email("ada@example.com").await.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_in_place_or_appends() {
        let dir = TempDir::new().unwrap();
        let users = repo(&dir);
        users.upsert(user("1", "a@example.com")).await.unwrap();
        users.upsert(user("2", "b@example.com")).await.unwrap();

        let mut renamed = user("1", "a@example.com");
        renamed.name = "Grace".into();
        users.upsert(renamed).await.unwrap();

        let all = users.reload().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Grace");
        assert_eq!(all[1].email, "b@example.com");
    }

    #[tokio::test]
    async fn records_survive_a_fresh_repository() {
        let dir = TempDir::new().unwrap();
        repo(&dir).insert(user("1", "a@example.com")).await.unwrap();

        let reopened = repo(&dir);
        let found = reopened.find_by_email("a@example.com").await.expect("persisted");
        assert_eq!(found.id, "1");
    }

    #[tokio::test]
    async fn update_by_email_unknown_user_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let users = repo(&dir);

        let out = users
            .update_by_email("ghost@example.com", |u| u.name = "x".into())
            .await
            .unwrap();
        assert!(out.is_none());
        assert!(!dir.path().join("users.json").exists());
    }
}
