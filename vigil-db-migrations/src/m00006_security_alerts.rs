use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod security_alert {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "security_alerts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub kind: String,
        pub severity: String,
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub user_id: Option<Uuid>,
        pub remote_ip: Option<String>,
        pub event_ids: Json,
        pub status: String,
        pub assigned_to: Option<Uuid>,
        #[sea_orm(column_type = "Text", nullable)]
        pub resolution: Option<String>,
        pub resolved_by: Option<Uuid>,
        pub resolved_at: Option<DateTime<Utc>>,
        pub created: DateTime<Utc>,
        pub updated: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00006_security_alerts"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(security_alert::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(security_alert::Entity)
                    .name("idx_security_alerts_status")
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(security_alert::Entity)
                    .name("idx_security_alerts_status")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(security_alert::Entity).to_owned())
            .await
    }
}
