use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmergencyContact::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmergencyContact::Id))
                    .col(uuid(EmergencyContact::UserId))
                    .col(string(EmergencyContact::Name))
                    .col(
                        ColumnDef::new(EmergencyContact::PhoneNumber)
                            .string()
                            .not_null()
                            .comment("Canonical +<countrycode><digits> form"),
                    )
                    .col(string_null(EmergencyContact::Email))
                    .col(string_null(EmergencyContact::Relationship))
                    .col(boolean(EmergencyContact::IsPrimary).default(false))
                    .col(
                        timestamp_with_time_zone(EmergencyContact::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmergencyContact::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_emergency_contact_user_id")
                    .table(EmergencyContact::Table)
                    .col(EmergencyContact::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_emergency_contact_user_id")
                    .table(EmergencyContact::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(EmergencyContact::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmergencyContact {
    Table,
    Id,
    UserId,
    Name,
    PhoneNumber,
    Email,
    Relationship,
    IsPrimary,
    CreatedAt,
    UpdatedAt,
}
