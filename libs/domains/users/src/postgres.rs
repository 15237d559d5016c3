use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{outbox_message, user};
use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter, normalize};
use crate::outbox::{OutboxEvent, OutboxMessage};
use crate::repository::UserRepository;

const USERNAME_CONSTRAINT: &str = "uq_users_normalized_username";

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn save(&self, user: User, events: Vec<OutboxEvent>, insert: bool) -> UserResult<User> {
        let txn = self.db.begin().await.map_err(db_error)?;
        let active = user::ActiveModel::from(&user);

        let saved = if insert {
            active.insert(&txn).await
        } else {
            active.update(&txn).await
        }
        .map_err(|e| write_error(e, &user))?;

        for event in events {
            let message = OutboxMessage::new(event);
            outbox_message::ActiveModel::try_from(&message)?
                .insert(&txn)
                .await
                .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;
        User::try_from(saved)
    }

    async fn find_one(&self, condition: Condition) -> UserResult<Option<User>> {
        user::Entity::find()
            .filter(condition)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }
}

fn db_error(e: DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

fn write_error(e: DbErr, user: &User) -> UserError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains(USERNAME_CONSTRAINT) => {
            UserError::DuplicateUsername(user.username.clone())
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail(user.email.clone()),
        _ => match e {
            DbErr::RecordNotUpdated => UserError::NotFound(user.id),
            other => db_error(other),
        },
    }
}

fn filter_condition(filter: &UserFilter) -> Condition {
    Condition::all()
        .add_option(filter.role.map(|role| user::Column::RoleName.eq(role.to_string())))
        .add_option(filter.team_id.map(|team_id| user::Column::TeamId.eq(team_id)))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User> {
        let created = self.save(user, events, true).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "Created user");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        self.find_one(Condition::all().add(user::Column::Id.eq(id)))
            .await
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        self.find_one(Condition::all().add(user::Column::NormalizedUsername.eq(normalize(username))))
            .await
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.find_one(Condition::all().add(user::Column::NormalizedEmail.eq(normalize(email))))
            .await
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let rows = user::Entity::find()
            .filter(filter_condition(&filter))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self, filter: UserFilter) -> UserResult<usize> {
        let count = user::Entity::find()
            .filter(filter_condition(&filter))
            .count(&self.db)
            .await
            .map_err(db_error)?;

        Ok(count as usize)
    }

    async fn update(&self, user: User, events: Vec<OutboxEvent>) -> UserResult<User> {
        let updated = self.save(user, events, false).await?;
        tracing::info!(user_id = %updated.id, "Updated user");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(result.rows_affected > 0)
    }

    async fn username_exists(&self, username: &str) -> UserResult<bool> {
        let count = user::Entity::find()
            .filter(user::Column::NormalizedUsername.eq(normalize(username)))
            .count(&self.db)
            .await
            .map_err(db_error)?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let count = user::Entity::find()
            .filter(user::Column::NormalizedEmail.eq(normalize(email)))
            .count(&self.db)
            .await
            .map_err(db_error)?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_filter_condition_builds_where_clause() {
        let filter = UserFilter {
            team_id: Some(Uuid::nil()),
            ..UserFilter::with_role(Role::Parent)
        };

        let sql = user::Entity::find()
            .filter(filter_condition(&filter))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""users"."role_name" = 'Parent'"#), "{sql}");
        assert!(sql.contains(r#""users"."team_id""#), "{sql}");
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        let sql = user::Entity::find()
            .filter(filter_condition(&UserFilter::default()))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(!sql.contains("role_name\" ="), "{sql}");
        assert!(!sql.contains("team_id\" ="), "{sql}");
    }

    #[test]
    fn test_missing_row_on_update_is_not_found() {
        let user = User::new(
            "ghost".into(),
            "ghost@league.test".into(),
            "Ghost".into(),
            "5550102030".into(),
            None,
        );
        let err = write_error(DbErr::RecordNotUpdated, &user);
        assert!(matches!(err, UserError::NotFound(id) if id == user.id));
    }
}
