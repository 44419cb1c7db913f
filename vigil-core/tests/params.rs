mod common;

use sea_orm::{EntityTrait, PaginatorTrait};
use vigil_core::params::{keys, ParameterStore, DEFAULT_PARAMETERS};
use vigil_db_entities::Parameter;
use vigil_db_entities::Parameter::ParameterKind;

#[tokio::test]
async fn test_seeding_is_idempotent() {
    let services = common::test_services().await;

    // Services::from_connection already seeded once
    services.params.seed_defaults().await.unwrap();
    services.params.seed_defaults().await.unwrap();

    let db = services.db.lock().await;
    let count = Parameter::Entity::find().count(&*db).await.unwrap();
    assert_eq!(count, DEFAULT_PARAMETERS.len() as u64);
}

#[tokio::test]
async fn test_missing_key_yields_default() {
    let services = common::test_services().await;
    assert_eq!(services.params.get_i64("no.such.key", 42).await, 42);
    assert_eq!(
        services.params.get_str("no.such.key", "fallback").await,
        "fallback"
    );
    assert!(services.params.get_bool("no.such.key", true).await);
}

#[tokio::test]
async fn test_malformed_value_yields_default() {
    let services = common::test_services().await;
    services
        .params
        .update(keys::LOGIN_MAX_ATTEMPTS_PER_MINUTE, "not-a-number", None)
        .await
        .unwrap();

    assert_eq!(
        services
            .params
            .get_i64(keys::LOGIN_MAX_ATTEMPTS_PER_MINUTE, 10)
            .await,
        10
    );
}

#[tokio::test]
async fn test_update_is_write_through() {
    let services = common::test_services().await;
    services
        .params
        .update(keys::SESSION_MAX_ACTIVE_PER_USER, "3", None)
        .await
        .unwrap();

    assert_eq!(
        services
            .params
            .get_i64(keys::SESSION_MAX_ACTIVE_PER_USER, 5)
            .await,
        3
    );
}

#[tokio::test]
async fn test_update_unknown_key_is_an_error() {
    let services = common::test_services().await;
    let result = services.params.update("no.such.key", "1", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cold_snapshot_lazy_fills_from_db() {
    let services = common::test_services().await;
    services
        .params
        .create(
            "custom.flag",
            "true",
            ParameterKind::Boolean,
            "custom",
            None,
        )
        .await
        .unwrap();

    // A store with an empty snapshot over the same database
    let cold = ParameterStore::new(services.db.clone());
    assert!(cold.get_bool("custom.flag", false).await);
}
