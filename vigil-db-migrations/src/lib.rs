use sea_orm::DatabaseConnection;
use sea_orm_migration::prelude::*;
use sea_orm_migration::MigrationTrait;

mod m00001_parameters;
mod m00002_login_attempts;
mod m00003_ip_blocks;
mod m00004_sessions;
mod m00005_security_events;
mod m00006_security_alerts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m00001_parameters::Migration),
            Box::new(m00002_login_attempts::Migration),
            Box::new(m00003_ip_blocks::Migration),
            Box::new(m00004_sessions::Migration),
            Box::new(m00005_security_events::Migration),
            Box::new(m00006_security_alerts::Migration),
        ]
    }
}

pub async fn migrate_database(connection: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(connection, None).await
}
