use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod ip_block {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "ip_blocks")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub ip_address: String,
        #[sea_orm(column_type = "Text")]
        pub reason: String,
        pub origin: String,
        pub admin_id: Option<Uuid>,
        pub permanent: bool,
        pub expires_at: Option<DateTime<Utc>>,
        pub attempt_count: i32,
        pub active: bool,
        pub blocked_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00003_ip_blocks"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(ip_block::Entity))
            .await?;

        // Expiry sweep scans active blocks by expiry
        manager
            .create_index(
                Index::create()
                    .table(ip_block::Entity)
                    .name("idx_ip_blocks_active_expires_at")
                    .col(Alias::new("active"))
                    .col(Alias::new("expires_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(ip_block::Entity)
                    .name("idx_ip_blocks_active_expires_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ip_block::Entity).to_owned())
            .await
    }
}
