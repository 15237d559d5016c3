use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter, normalize};
use crate::outbox::{InMemoryOutbox, OutboxEvent, OutboxMessage};

/// Repository trait for User persistence.
///
/// Writes take the outbox events caused by the change; implementations commit
/// them atomically with the user row.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails on a duplicate username or email.
    async fn create(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Case-insensitive.
    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>>;

    /// Case-insensitive.
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// List users with optional filters, oldest first
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Count matching users, ignoring pagination
    async fn count(&self, filter: UserFilter) -> UserResult<usize>;

    /// Persist every field of an existing user.
    async fn update(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User>;

    /// Delete a user by ID
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    async fn username_exists(&self, username: &str) -> UserResult<bool>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    outbox: InMemoryOutbox,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outbox this repository commits events into.
    pub fn outbox(&self) -> InMemoryOutbox {
        self.outbox.clone()
    }
}

fn find_conflict<'a>(
    mut users: impl Iterator<Item = &'a User>,
    user: &User,
) -> Option<UserError> {
    let username = user.normalized_username();

    users.find_map(|existing| {
        if existing.id == user.id {
            None
        } else if existing.normalized_username() == username {
            Some(UserError::DuplicateUsername(user.username.clone()))
        } else if existing.normalized_email == user.normalized_email {
            Some(UserError::DuplicateEmail(user.email.clone()))
        } else {
            None
        }
    })
}

fn into_messages(events: Vec<OutboxEvent>) -> Vec<OutboxMessage> {
    events.into_iter().map(OutboxMessage::new).collect()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User> {
        let mut users = self.users.write().await;

        if let Some(conflict) = find_conflict(users.values(), &user) {
            return Err(conflict);
        }

        users.insert(user.id, user.clone());
        self.outbox.append(into_messages(events)).await;

        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let key = normalize(username);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.normalized_username() == key).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let key = normalize(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.normalized_email == key).cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;

        let mut result: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn count(&self, filter: UserFilter) -> UserResult<usize> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count())
    }

    async fn update(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        if let Some(conflict) = find_conflict(users.values(), &user) {
            return Err(conflict);
        }

        users.insert(user.id, user.clone());
        self.outbox.append(into_messages(events)).await;

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        if users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn username_exists(&self, username: &str) -> UserResult<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
