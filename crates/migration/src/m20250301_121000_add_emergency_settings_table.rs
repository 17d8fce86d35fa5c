use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmergencySettings::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmergencySettings::Id))
                    .col(uuid_uniq(EmergencySettings::UserId))
                    .col(boolean(EmergencySettings::AutoSendLocation).default(true))
                    .col(boolean(EmergencySettings::SendSms).default(true))
                    .col(boolean(EmergencySettings::MakeEmergencyCall).default(false))
                    .col(boolean(EmergencySettings::ShareLiveLocation).default(true))
                    .col(
                        ColumnDef::new(EmergencySettings::CountdownSeconds)
                            .integer()
                            .not_null()
                            .default(5)
                            .comment("Seconds before an armed SOS fires, 1-30"),
                    )
                    .col(
                        timestamp_with_time_zone(EmergencySettings::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmergencySettings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmergencySettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmergencySettings {
    Table,
    Id,
    UserId,
    AutoSendLocation,
    SendSms,
    MakeEmergencyCall,
    ShareLiveLocation,
    CountdownSeconds,
    CreatedAt,
    UpdatedAt,
}
