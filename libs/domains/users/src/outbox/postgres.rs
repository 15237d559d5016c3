use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::{OutboxMessage, OutboxRepository, OutboxStatus};
use crate::entity::outbox_message;
use crate::error::{UserError, UserResult};

fn db_error(e: sea_orm::DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

/// Outbox backed by the `outbox_messages` table.
///
/// Rows are claimed without row locks, so only one relay may run against a
/// database at a time.
#[derive(Clone)]
pub struct PostgresOutbox {
    db: DatabaseConnection,
}

impl PostgresOutbox {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: Uuid) -> UserResult<outbox_message::Model> {
        outbox_message::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| UserError::Internal(format!("Outbox message {} vanished", id)))
    }
}

#[async_trait]
impl OutboxRepository for PostgresOutbox {
    async fn fetch_pending(&self, limit: usize) -> UserResult<Vec<OutboxMessage>> {
        let rows = outbox_message::Entity::find()
            .filter(outbox_message::Column::Status.eq(OutboxStatus::Pending.to_string()))
            .order_by_asc(outbox_message::Column::CreatedAt)
            .limit(limit as u64)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(OutboxMessage::try_from).collect()
    }

    async fn mark_delivered(&self, id: Uuid) -> UserResult<()> {
        let model = self.find(id).await?;
        let attempts = model.attempts + 1;

        let mut active: outbox_message::ActiveModel = model.into();
        active.status = Set(OutboxStatus::Delivered.to_string());
        active.attempts = Set(attempts);
        active.processed_at = Set(Some(Utc::now().into()));
        active.update(&self.db).await.map_err(db_error)?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, max_attempts: u32) -> UserResult<OutboxStatus> {
        let model = self.find(id).await?;
        let mut message = OutboxMessage::try_from(model.clone())?;
        let status = message.record_failure(error, max_attempts);

        let mut active: outbox_message::ActiveModel = model.into();
        active.status = Set(status.to_string());
        active.attempts = Set(message.attempts as i32);
        active.last_error = Set(message.last_error);
        active.processed_at = Set(message.processed_at.map(Into::into));
        active.update(&self.db).await.map_err(db_error)?;

        Ok(status)
    }
}
