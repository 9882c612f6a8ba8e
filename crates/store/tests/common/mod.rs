//! Shared test fixtures: a file-backed store in a temp directory.
//!
//! The writer connection and the read pool must see the same database, so
//! tests use real files rather than in-memory SQLite.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::time::Duration;

use order_desk_core::{Email, PaymentStatus, ServiceItem, UserId};
use order_desk_store::db::RetryPolicy;
use order_desk_store::models::NewOrder;
use order_desk_store::{Store, StoreConfig};
use tempfile::TempDir;

pub struct TestStore {
    pub store: Store,
    pub config: StoreConfig,
    // Held so the database file outlives the test body.
    _dir: TempDir,
}

pub async fn open_test_store() -> TestStore {
    open_test_store_with(|_| {}).await
}

/// Open a store on a fresh temp file, letting the test tweak the config
/// (typically shrinking the retry policy and busy timeout).
pub async fn open_test_store_with(adjust: impl FnOnce(&mut StoreConfig)) -> TestStore {
    init_logging();

    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = StoreConfig {
        database_path: dir.path().join("orders.db"),
        ..StoreConfig::default()
    };
    adjust(&mut config);

    let store = Store::open(&config).await.expect("open store");
    TestStore {
        store,
        config,
        _dir: dir,
    }
}

/// A retry policy small enough to exhaust inside a test.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(10),
    }
}

pub fn email(addr: &str) -> Email {
    Email::parse(addr).expect("valid test email")
}

pub fn sample_order(user_id: Option<UserId>, name: &str) -> NewOrder {
    NewOrder {
        user_id,
        name: name.to_owned(),
        email: "customer@example.com".to_owned(),
        telegram: "@customer".to_owned(),
        service: "site audit".to_owned(),
        message: "please start next week".to_owned(),
        payment_status: PaymentStatus::Pending,
        services: vec![
            ServiceItem::new("site audit", 200.0),
            ServiceItem::new("follow-up call", 50.0),
        ],
    }
}

fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
