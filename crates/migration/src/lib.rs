pub use sea_orm_migration::prelude::*;

mod m20250301_120000_add_emergency_alert_table;
mod m20250301_120500_add_emergency_contact_table;
mod m20250301_121000_add_emergency_settings_table;
mod m20250308_090000_add_notification_log_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_120000_add_emergency_alert_table::Migration),
            Box::new(m20250301_120500_add_emergency_contact_table::Migration),
            Box::new(m20250301_121000_add_emergency_settings_table::Migration),
            Box::new(m20250308_090000_add_notification_log_table::Migration),
        ]
    }
}
