use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod session {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "sessions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        #[sea_orm(unique)]
        pub token_hash: String,
        pub remote_ip: String,
        #[sea_orm(column_type = "Text")]
        pub user_agent: String,
        pub device: String,
        pub browser: String,
        pub os: String,
        pub active: bool,
        pub last_activity: DateTime<Utc>,
        pub created: DateTime<Utc>,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00004_sessions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(session::Entity))
            .await?;

        // Cap enforcement lists a user's active sessions by last activity
        manager
            .create_index(
                Index::create()
                    .table(session::Entity)
                    .name("idx_sessions_user_active_last_activity")
                    .col(Alias::new("user_id"))
                    .col(Alias::new("active"))
                    .col(Alias::new("last_activity"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(session::Entity)
                    .name("idx_sessions_active_expires_at")
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
                    .table(session::Entity)
                    .name("idx_sessions_user_active_last_activity")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .table(session::Entity)
                    .name("idx_sessions_active_expires_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(session::Entity).to_owned())
            .await
    }
}
