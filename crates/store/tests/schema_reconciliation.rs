//! Integration tests for additive schema reconciliation.

mod common;

use order_desk_core::{OrderStatus, PaymentStatus};
use order_desk_store::models::OrderUpdate;
use order_desk_store::{Store, StoreConfig};
use sqlx::ConnectOptions;
use sqlx::Connection;
use sqlx::sqlite::SqliteConnectOptions;

use common::{email, open_test_store};

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn reconciling_a_current_schema_issues_nothing() {
    let ts = open_test_store().await;

    // Store::open already reconciled once; the schema is current.
    let report = ts.store.reconcile_schema().await;
    assert_eq!(report.statements_issued, 0);
    assert_eq!(report.failed_tables, 0);

    let again = ts.store.reconcile_schema().await;
    assert_eq!(again.statements_issued, 0);
}

// =============================================================================
// Migrating a legacy database file
// =============================================================================

/// Shape of the tables before the status/payment/2FA era.
async fn seed_legacy_database(path: &std::path::Path) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .expect("create legacy database");

    for sql in [
        "CREATE TABLE users (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT,
             email TEXT UNIQUE,
             password TEXT,
             phone TEXT,
             address TEXT
         )",
        "CREATE TABLE orders (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT,
             email TEXT,
             telegram TEXT,
             service TEXT,
             message TEXT,
             created_at DATETIME DEFAULT CURRENT_TIMESTAMP
         )",
        "INSERT INTO users (name, email, password, phone, address)
         VALUES ('Old Timer', 'old@example.com', 'legacy-hash', '', '')",
        "INSERT INTO orders (name, email, telegram, service, message)
         VALUES ('legacy order', 'old@example.com', '@old', 'banner', 'from before')",
    ] {
        sqlx::query(sql).execute(&mut conn).await.expect("seed legacy schema");
    }

    conn.close().await.expect("close seeding connection");
}

#[tokio::test]
async fn legacy_file_gains_missing_columns_without_losing_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        database_path: dir.path().join("orders.db"),
        ..StoreConfig::default()
    };
    seed_legacy_database(&config.database_path).await;

    let store = Store::open(&config).await.expect("open over legacy file");

    // Old user survived, with the avatar backfilled and 2FA defaulted off.
    let user = store
        .users()
        .get_by_email(&email("old@example.com"))
        .await
        .unwrap()
        .expect("legacy user still present");
    assert_eq!(user.name, "Old Timer");
    assert_eq!(user.avatar, "image/avatar.png");
    assert!(!user.two_factor_enabled);
    assert!(user.two_factor_secret.is_none());

    // The legacy order can be updated through the new status columns.
    let changed = store
        .orders()
        .update_fields(
            order_desk_core::OrderId::new(1),
            OrderUpdate {
                status: Some(OrderStatus::Completed),
                payment_status: Some(PaymentStatus::Paid),
            },
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);

    // A second pass has nothing left to do.
    let report = store.reconcile_schema().await;
    assert_eq!(report.statements_issued, 0);
    assert_eq!(report.failed_tables, 0);
}

#[tokio::test]
async fn reopening_a_current_file_is_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        database_path: dir.path().join("orders.db"),
        ..StoreConfig::default()
    };

    {
        let store = Store::open(&config).await.unwrap();
        store
            .users()
            .create("Ada", &email("ada@example.com"), "hash")
            .await
            .unwrap();
        store.close().await;
    }

    let store = Store::open(&config).await.unwrap();
    let report = store.reconcile_schema().await;
    assert_eq!(report.statements_issued, 0);

    // Data written before the reopen is still there.
    assert!(
        store
            .users()
            .get_by_email(&email("ada@example.com"))
            .await
            .unwrap()
            .is_some()
    );
}
