use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::UserError;
use crate::outbox::OutboxMessage;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outbox_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub payload: Json,
    pub status: String,
    pub attempts: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub processed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for OutboxMessage {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| UserError::Internal(format!("Outbox message {} has bad {}", model.id, what));

        Ok(Self {
            id: model.id,
            event: serde_json::from_value(model.payload.clone()).map_err(|_| corrupt("payload"))?,
            status: model.status.parse().map_err(|_| corrupt("status"))?,
            attempts: u32::try_from(model.attempts).map_err(|_| corrupt("attempt count"))?,
            last_error: model.last_error.clone(),
            created_at: model.created_at.into(),
            processed_at: model.processed_at.map(Into::into),
        })
    }
}

impl TryFrom<&OutboxMessage> for ActiveModel {
    type Error = UserError;

    fn try_from(message: &OutboxMessage) -> Result<Self, Self::Error> {
        let payload = serde_json::to_value(&message.event)
            .map_err(|e| UserError::Internal(format!("Failed to encode outbox event: {}", e)))?;

        Ok(ActiveModel {
            id: Set(message.id),
            kind: Set(message.event.kind().to_string()),
            payload: Set(payload),
            status: Set(message.status.to_string()),
            attempts: Set(message.attempts as i32),
            last_error: Set(message.last_error.clone()),
            created_at: Set(message.created_at.into()),
            processed_at: Set(message.processed_at.map(Into::into)),
        })
    }
}
