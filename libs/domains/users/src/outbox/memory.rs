use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OutboxMessage, OutboxRepository, OutboxStatus};
use crate::error::{UserError, UserResult};

/// In-memory outbox, shared with [`InMemoryUserRepository`](crate::InMemoryUserRepository).
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutbox {
    messages: Arc<RwLock<Vec<OutboxMessage>>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn append(&self, messages: Vec<OutboxMessage>) {
        if messages.is_empty() {
            return;
        }
        self.messages.write().await.extend(messages);
    }

    /// Snapshot of every message, in insertion order.
    pub async fn messages(&self) -> Vec<OutboxMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutbox {
    async fn fetch_pending(&self, limit: usize) -> UserResult<Vec<OutboxMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.status == OutboxStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_delivered(&self, id: Uuid) -> UserResult<()> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| UserError::Internal(format!("Outbox message {} vanished", id)))?;

        message.status = OutboxStatus::Delivered;
        message.attempts += 1;
        message.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, max_attempts: u32) -> UserResult<OutboxStatus> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| UserError::Internal(format!("Outbox message {} vanished", id)))?;

        Ok(message.record_failure(error, max_attempts))
    }
}
