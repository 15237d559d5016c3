//! Transactional outbox for cross-service side effects.
//!
//! Events are committed together with the user change that caused them and
//! delivered later by [`OutboxRelay`], so a role grant never commits without
//! its carpool registration being queued (and vice versa).

mod memory;
mod postgres;
mod relay;

pub use memory::InMemoryOutbox;
pub use postgres::PostgresOutbox;
pub use relay::OutboxRelay;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::clients::EmailMessage;
use crate::error::UserResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboxEvent {
    /// Add a new Parent to their team's carpool recipient list.
    RegisterCarpoolRecipient {
        user_id: Uuid,
        team_id: Uuid,
        /// Token of the caller who granted the role
        bearer_token: String,
    },
    SendEmail(EmailMessage),
}

impl OutboxEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboxEvent::RegisterCarpoolRecipient { .. } => "register_carpool_recipient",
            OutboxEvent::SendEmail(_) => "send_email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Delivered,
    /// Gave up after the configured number of attempts
    Dead,
}

#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub event: OutboxEvent,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    pub fn new(event: OutboxEvent) -> Self {
        Self {
            id: Uuid::now_v7(),
            event,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Records a failed attempt, returning the resulting status.
    pub fn record_failure(&mut self, error: &str, max_attempts: u32) -> OutboxStatus {
        self.attempts += 1;
        self.last_error = Some(error.to_string());
        if self.attempts >= max_attempts {
            self.status = OutboxStatus::Dead;
            self.processed_at = Some(Utc::now());
        }
        self.status
    }
}

/// Read side used by the relay; writes happen through the user repository.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Oldest pending messages first.
    async fn fetch_pending(&self, limit: usize) -> UserResult<Vec<OutboxMessage>>;

    async fn mark_delivered(&self, id: Uuid) -> UserResult<()>;

    async fn mark_failed(&self, id: Uuid, error: &str, max_attempts: u32) -> UserResult<OutboxStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = OutboxEvent::RegisterCarpoolRecipient {
            user_id: Uuid::nil(),
            team_id: Uuid::nil(),
            bearer_token: "t".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());

        let back: OutboxEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_record_failure_goes_dead_at_budget() {
        let mut message = OutboxMessage::new(OutboxEvent::SendEmail(EmailMessage {
            to: vec![],
            subject: String::new(),
            content: String::new(),
        }));

        assert_eq!(message.record_failure("boom", 2), OutboxStatus::Pending);
        assert_eq!(message.record_failure("boom", 2), OutboxStatus::Dead);
        assert_eq!(message.attempts, 2);
        assert!(message.processed_at.is_some());
    }
}
