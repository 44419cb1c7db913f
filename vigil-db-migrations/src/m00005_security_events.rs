use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod security_event {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "security_events")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub kind: String,
        pub severity: String,
        pub remote_ip: String,
        pub user_id: Option<Uuid>,
        pub email: Option<String>,
        pub endpoint: Option<String>,
        pub method: Option<String>,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub metadata: Json,
        pub reviewed: bool,
        pub reviewed_by: Option<Uuid>,
        pub reviewed_at: Option<DateTime<Utc>>,
        #[sea_orm(column_type = "Text", nullable)]
        pub review_notes: Option<String>,
        pub timestamp: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00005_security_events"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(security_event::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(security_event::Entity)
                    .name("idx_security_events_kind_severity_timestamp")
                    .col(Alias::new("kind"))
                    .col(Alias::new("severity"))
                    .col(Alias::new("timestamp"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(security_event::Entity)
                    .name("idx_security_events_ip_timestamp")
                    .col(Alias::new("remote_ip"))
                    .col(Alias::new("timestamp"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(security_event::Entity)
                    .name("idx_security_events_kind_severity_timestamp")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .table(security_event::Entity)
                    .name("idx_security_events_ip_timestamp")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(security_event::Entity).to_owned())
            .await
    }
}
