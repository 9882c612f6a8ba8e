//! Integration tests for the entity repositories: contracts around
//! created identities, affected row counts, owner scoping, and the
//! malformed-blob failure mode.

mod common;

use order_desk_core::{OrderId, OrderStatus, PaymentStatus, ReviewId, UserId};
use order_desk_store::StoreError;
use order_desk_store::db::Statement;
use order_desk_store::models::{NewContactMessage, ProfileUpdate};

use common::{email, open_test_store, sample_order};

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn user_round_trip_and_credential_check() {
    let ts = open_test_store().await;
    let users = ts.store.users();

    let id = users
        .create("Ada", &email("ada@example.com"), "bcrypt$abc")
        .await
        .unwrap();

    let user = users
        .get_by_email(&email("ada@example.com"))
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.name, "Ada");
    assert_eq!(user.avatar, "image/avatar.png");
    assert!(!user.two_factor_enabled);

    // The stored hash reaches the caller-supplied check untouched.
    assert!(
        users
            .verify_credential(&email("ada@example.com"), |hash| hash == "bcrypt$abc")
            .await
            .unwrap()
    );
    assert!(
        !users
            .verify_credential(&email("ada@example.com"), |hash| hash == "wrong")
            .await
            .unwrap()
    );
    // Unknown account verifies false, not as an error.
    assert!(
        !users
            .verify_credential(&email("nobody@example.com"), |_| true)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let ts = open_test_store().await;
    let users = ts.store.users();

    users
        .create("Ada", &email("ada@example.com"), "h1")
        .await
        .unwrap();
    let err = users
        .create("Imposter", &email("ada@example.com"), "h2")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn profile_updates_report_row_counts() {
    let ts = open_test_store().await;
    let users = ts.store.users();
    let id = users
        .create("Ada", &email("ada@example.com"), "hash")
        .await
        .unwrap();

    let changed = users
        .update_profile(
            id,
            ProfileUpdate {
                name: "Ada L.".to_owned(),
                email: email("ada.l@example.com"),
                phone: "+1 555 0100".to_owned(),
                address: "12 Engine St".to_owned(),
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let user = users
        .get_by_email(&email("ada.l@example.com"))
        .await
        .unwrap()
        .expect("updated email resolves");
    assert_eq!(user.phone, "+1 555 0100");
    assert_eq!(user.avatar, "image/avatar.png");

    // Unknown target: zero rows, not an error.
    let changed = users
        .change_credential(UserId::new(9999), "new-hash")
        .await
        .unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn two_factor_enrollment_flow() {
    let ts = open_test_store().await;
    let users = ts.store.users();
    let id = users
        .create("Ada", &email("ada@example.com"), "hash")
        .await
        .unwrap();

    assert_eq!(users.set_two_factor_secret(id, "SECRET1").await.unwrap(), 1);
    assert_eq!(users.set_two_factor_enabled(id, true).await.unwrap(), 1);

    let user = users
        .get_by_email(&email("ada@example.com"))
        .await
        .unwrap()
        .expect("user exists");
    assert!(user.two_factor_enabled);
    assert_eq!(user.two_factor_secret.as_deref(), Some("SECRET1"));

    // Starting a new enrollment drops enforcement until re-verified.
    users.set_two_factor_secret(id, "SECRET2").await.unwrap();
    let user = users
        .get_by_email(&email("ada@example.com"))
        .await
        .unwrap()
        .expect("user exists");
    assert!(!user.two_factor_enabled);
    assert_eq!(user.two_factor_secret.as_deref(), Some("SECRET2"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn order_round_trip_is_owner_scoped() {
    let ts = open_test_store().await;
    let users = ts.store.users();
    let orders = ts.store.orders();

    let owner = users
        .create("Owner", &email("owner@example.com"), "h")
        .await
        .unwrap();
    let other = users
        .create("Other", &email("other@example.com"), "h")
        .await
        .unwrap();

    let order_id = orders.create(sample_order(Some(owner), "A")).await.unwrap();

    let fetched = orders
        .get(order_id, owner)
        .await
        .unwrap()
        .expect("owner sees the order");
    assert_eq!(fetched.name, "A");
    assert_eq!(fetched.status, OrderStatus::Processing);
    assert_eq!(fetched.payment_status, PaymentStatus::Pending);
    assert_eq!(fetched.total_amount, None);
    assert_eq!(fetched.services.len(), 2);

    // Someone else's id yields None, not an error.
    assert!(orders.get(order_id, other).await.unwrap().is_none());
    // So does a missing order.
    assert!(orders.get(OrderId::new(9999), owner).await.unwrap().is_none());
}

#[tokio::test]
async fn totals_are_set_transactionally() {
    let ts = open_test_store().await;
    let owner = ts
        .store
        .users()
        .create("Owner", &email("owner@example.com"), "h")
        .await
        .unwrap();
    let order_id = ts
        .store
        .orders()
        .create(sample_order(Some(owner), "A"))
        .await
        .unwrap();

    assert_eq!(
        ts.store.orders().update_total(order_id, 249.5).await.unwrap(),
        1
    );
    let fetched = ts
        .store
        .orders()
        .get(order_id, owner)
        .await
        .unwrap()
        .expect("order exists");
    assert_eq!(fetched.total_amount, Some(249.5));

    // Missing target reports zero changed rows.
    assert_eq!(
        ts.store
            .orders()
            .update_total(OrderId::new(9999), 1.0)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn malformed_line_item_blob_is_data_corruption() {
    let ts = open_test_store().await;
    let owner = ts
        .store
        .users()
        .create("Owner", &email("owner@example.com"), "h")
        .await
        .unwrap();
    let order_id = ts
        .store
        .orders()
        .create(sample_order(Some(owner), "A"))
        .await
        .unwrap();

    ts.store
        .writer()
        .enqueue(
            Statement::new("UPDATE orders SET services = ? WHERE id = ?")
                .bind("{definitely not json")
                .bind(order_id.as_i64()),
        )
        .await
        .unwrap();

    let err = ts.store.orders().get(order_id, owner).await.unwrap_err();
    assert!(matches!(err, StoreError::DataCorruption(_)));

    let err = ts.store.orders().list_for_user(owner).await.unwrap_err();
    assert!(matches!(err, StoreError::DataCorruption(_)));
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn reviews_join_their_author_and_are_owner_deletable() {
    let ts = open_test_store().await;
    let users = ts.store.users();
    let reviews = ts.store.reviews();

    let author = users
        .create("Ada", &email("ada@example.com"), "h")
        .await
        .unwrap();
    let stranger = users
        .create("Sam", &email("sam@example.com"), "h")
        .await
        .unwrap();

    let review_id = reviews.create(author, 5, "great work").await.unwrap();
    reviews.create(stranger, 4, "solid").await.unwrap();

    let listed = reviews.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    let ada_review = listed
        .iter()
        .find(|r| r.review.id == review_id)
        .expect("ada's review listed");
    assert_eq!(ada_review.author_name, "Ada");
    assert_eq!(ada_review.author_avatar, "image/avatar.png");
    assert_eq!(ada_review.review.rating, 5);

    // Not the author: zero rows, review stays.
    assert_eq!(reviews.delete(review_id, stranger).await.unwrap(), 0);
    assert_eq!(reviews.list().await.unwrap().len(), 2);

    // The author: one row, review gone.
    assert_eq!(reviews.delete(review_id, author).await.unwrap(), 1);
    assert_eq!(reviews.list().await.unwrap().len(), 1);

    // Deleting again finds nothing.
    assert_eq!(reviews.delete(ReviewId::new(review_id.as_i64()), author).await.unwrap(), 0);
}

// =============================================================================
// Contact messages
// =============================================================================

#[tokio::test]
async fn contact_messages_append() {
    let ts = open_test_store().await;

    let first = ts
        .store
        .contact_messages()
        .create(NewContactMessage {
            name: "Visitor".to_owned(),
            email: "visitor@example.com".to_owned(),
            telegram: "@visitor".to_owned(),
            message: "do you do logos?".to_owned(),
        })
        .await
        .unwrap();
    let second = ts
        .store
        .contact_messages()
        .create(NewContactMessage {
            name: "Visitor".to_owned(),
            email: "visitor@example.com".to_owned(),
            telegram: "@visitor".to_owned(),
            message: "following up".to_owned(),
        })
        .await
        .unwrap();

    assert!(first.as_i64() > 0);
    assert!(second.as_i64() > first.as_i64());
}
