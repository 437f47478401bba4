//! Configuration registry: named lookup, main configuration, duplicate
//! and unknown names.

mod common;

use common::FakeDb;
use dbrow::dialect::{MysqlDialect, PostgresDialect};
use dbrow::{DbConfig, Registry, Value};

fn config(name: &str) -> DbConfig {
    // Reuse the spy provider; only the registry mechanics matter here.
    let fake = FakeDb::new(MysqlDialect);
    DbConfig::builder(name)
        .dialect(PostgresDialect)
        .provider_arc(fake.provider.clone())
        .build()
        .unwrap()
}

#[test]
fn test_first_registration_becomes_main() {
    let registry = Registry::new();
    registry.register(config("main-db")).unwrap();
    registry.register(config("analytics")).unwrap();

    let main = registry.main().unwrap();
    assert_eq!(main.config().name(), "main-db");
    let other = registry.get("analytics").unwrap();
    assert_eq!(other.config().name(), "analytics");
}

#[test]
fn test_duplicate_name_rejected() {
    let registry = Registry::new();
    registry.register(config("main-db")).unwrap();
    let err = registry.register(config("main-db")).unwrap_err();
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn test_unknown_name_rejected() {
    let registry = Registry::new();
    assert!(registry.get("nope").is_err());
    assert!(registry.main().is_err());
}

#[test]
fn test_remove_configuration() {
    let registry = Registry::new();
    registry.register(config("main-db")).unwrap();
    registry.remove("main-db").unwrap();
    assert!(registry.get("main-db").is_err());
    assert!(registry.remove("main-db").is_err());
}

#[test]
fn test_incomplete_config_rejected() {
    let err = DbConfig::builder("broken").build().unwrap_err();
    assert!(err.to_string().contains("no dialect"));
}

#[tokio::test]
async fn test_registry_handle_reaches_the_driver() {
    let fake = FakeDb::new(MysqlDialect);
    let registry = Registry::new();
    let db = registry
        .register(
            DbConfig::builder("spied")
                .dialect(MysqlDialect)
                .provider_arc(fake.provider.clone())
                .build()
                .unwrap(),
        )
        .unwrap();

    fake.queue_rows(&["id"], vec![vec![Value::Int(1)]]);
    let result = db.query("select id from user", &[]).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(fake.prepared_sql(), vec!["select id from user".to_string()]);
}
