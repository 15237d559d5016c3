use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutboxMessages::Table)
                    .if_not_exists()
                    .col(pk_uuid(OutboxMessages::Id))
                    .col(string_len(OutboxMessages::Kind, 64))
                    .col(json_binary(OutboxMessages::Payload))
                    .col(string_len(OutboxMessages::Status, 16).default("pending"))
                    .col(integer(OutboxMessages::Attempts).default(0))
                    .col(text_null(OutboxMessages::LastError))
                    .col(
                        timestamp_with_time_zone(OutboxMessages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(OutboxMessages::ProcessedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outbox_messages_status_created_at")
                    .table(OutboxMessages::Table)
                    .col(OutboxMessages::Status)
                    .col(OutboxMessages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutboxMessages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OutboxMessages {
    Table,
    Id,
    Kind,
    Payload,
    Status,
    Attempts,
    LastError,
    CreatedAt,
    ProcessedAt,
}
