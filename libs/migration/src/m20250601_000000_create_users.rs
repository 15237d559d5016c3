use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_uuid(Users::Id))
                    .col(string_len(Users::Username, 64))
                    .col(string_len(Users::NormalizedUsername, 64))
                    .col(string_len(Users::Email, 255))
                    .col(string_len(Users::NormalizedEmail, 255))
                    .col(string_len(Users::PhoneNumber, 32))
                    .col(string_len(Users::FullName, 100))
                    .col(text(Users::PasswordHash))
                    .col(string(Users::SecurityStamp))
                    .col(uuid_null(Users::TeamId))
                    .col(string_len(Users::RoleName, 32).default("UnconfirmedUser"))
                    .col(string_len_null(Users::RequestedRole, 32))
                    .col(boolean(Users::EmailConfirmed).default(false))
                    .col(string_null(Users::EmailConfirmationTokenHash))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness is enforced on the normalized forms; the repository maps
        // violations of these two indexes back to duplicate-username/email errors.
        manager
            .create_index(
                Index::create()
                    .name("uq_users_normalized_username")
                    .table(Users::Table)
                    .col(Users::NormalizedUsername)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_users_normalized_email")
                    .table(Users::Table)
                    .col(Users::NormalizedEmail)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_role_name")
                    .table(Users::Table)
                    .col(Users::RoleName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_team_id")
                    .table(Users::Table)
                    .col(Users::TeamId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    NormalizedUsername,
    Email,
    NormalizedEmail,
    PhoneNumber,
    FullName,
    PasswordHash,
    SecurityStamp,
    TeamId,
    RoleName,
    RequestedRole,
    EmailConfirmed,
    EmailConfirmationTokenHash,
    CreatedAt,
    UpdatedAt,
}
