use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// One row per contact per alert attempt, so fan-outs are auditable and a
/// resend can tell which contacts were already attempted.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationLog::Table)
                    .if_not_exists()
                    .col(pk_uuid(NotificationLog::Id))
                    .col(uuid(NotificationLog::AlertId))
                    .col(uuid(NotificationLog::UserId))
                    .col(uuid(NotificationLog::ContactId))
                    .col(string(NotificationLog::Channel))
                    .col(text(NotificationLog::Message))
                    .col(
                        ColumnDef::new(NotificationLog::Status)
                            .string()
                            .not_null()
                            .comment("'pending', 'delivered' or 'failed'"),
                    )
                    .col(text_null(NotificationLog::Error))
                    .col(
                        timestamp_with_time_zone(NotificationLog::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(NotificationLog::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_notification_log_alert_id")
                            .col(NotificationLog::AlertId),
                    )
                    .index(
                        Index::create()
                            .name("idx_notification_log_user_id")
                            .col(NotificationLog::UserId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NotificationLog {
    Table,
    Id,
    AlertId,
    UserId,
    ContactId,
    Channel,
    Message,
    Status,
    Error,
    CreatedAt,
    UpdatedAt,
}
