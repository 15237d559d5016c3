use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::UserError;
use crate::models::User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub normalized_username: String,
    pub email: String,
    pub normalized_email: String,
    pub phone_number: String,
    pub full_name: String,
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
    pub security_stamp: String,
    pub team_id: Option<Uuid>,
    pub role_name: String,
    pub requested_role: Option<String>,
    pub email_confirmed: bool,
    pub email_confirmation_token_hash: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = model.role_name.parse().map_err(|_| {
            UserError::Internal(format!(
                "User {} has unknown role '{}'",
                model.id, model.role_name
            ))
        })?;
        let requested_role = model
            .requested_role
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|_| UserError::Internal(format!("User {} has unknown requested role", model.id)))?;

        Ok(Self {
            id: model.id,
            username: model.username,
            email: model.email,
            normalized_email: model.normalized_email,
            phone_number: model.phone_number,
            full_name: model.full_name,
            password_hash: model.password_hash,
            security_stamp: model.security_stamp,
            team_id: model.team_id,
            role,
            requested_role,
            email_confirmed: model.email_confirmed,
            email_confirmation_token_hash: model.email_confirmation_token_hash,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            normalized_username: Set(user.normalized_username()),
            email: Set(user.email.clone()),
            normalized_email: Set(user.normalized_email.clone()),
            phone_number: Set(user.phone_number.clone()),
            full_name: Set(user.full_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            security_stamp: Set(user.security_stamp.clone()),
            team_id: Set(user.team_id),
            role_name: Set(user.role.to_string()),
            requested_role: Set(user.requested_role.map(|r| r.to_string())),
            email_confirmed: Set(user.email_confirmed),
            email_confirmation_token_hash: Set(user.email_confirmation_token_hash.clone()),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
