use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmergencyAlert::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmergencyAlert::Id))
                    .col(uuid(EmergencyAlert::UserId))
                    .col(double(EmergencyAlert::Latitude))
                    .col(double(EmergencyAlert::Longitude))
                    .col(double_null(EmergencyAlert::Accuracy))
                    .col(
                        ColumnDef::new(EmergencyAlert::Status)
                            .string()
                            .not_null()
                            .comment("'active', 'resolved' or 'test'"),
                    )
                    .col(boolean(EmergencyAlert::IsTest).default(false))
                    .col(integer(EmergencyAlert::ContactsNotified).default(0))
                    .col(
                        timestamp_with_time_zone(EmergencyAlert::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmergencyAlert::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(EmergencyAlert::ResolvedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_emergency_alert_user_status")
                    .table(EmergencyAlert::Table)
                    .col(EmergencyAlert::UserId)
                    .col(EmergencyAlert::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_emergency_alert_created_at")
                    .table(EmergencyAlert::Table)
                    .col(EmergencyAlert::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_emergency_alert_created_at")
                    .table(EmergencyAlert::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_emergency_alert_user_status")
                    .table(EmergencyAlert::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(EmergencyAlert::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmergencyAlert {
    Table,
    Id,
    UserId,
    Latitude,
    Longitude,
    Accuracy,
    Status,
    IsTest,
    ContactsNotified,
    CreatedAt,
    UpdatedAt,
    ResolvedAt,
}
