//! Client managers against the in-process stub API.
//!
//! Each test starts its own stub on an ephemeral port, so they run in
//! parallel without shared state.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;

use karthik_client::{
    ApiClient, ClientConfig, MemoryStore, Origin, RemoteError, Storefront, SyncError,
};
use karthik_core::{
    AdminUserId, DemoStatus, NewDemoRequest, NewProduct, ProductId, ProductUpdate, Registration,
    Username, default_catalog,
};
use karthik_integration_tests::{StubServer, TEST_TIMEOUT, unreachable_url};

fn registration(username: &str, password: &str) -> Registration {
    Registration {
        username: Username::new(username),
        password: password.to_owned(),
        full_name: "Asha Rao".to_owned(),
        email: "asha@example.com".to_owned(),
        ..Registration::default()
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_is_mirrored_from_server() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    let shop = stub.storefront().unwrap();

    let loaded = shop.catalog.load_products().await.unwrap();

    assert_eq!(loaded.origin, Origin::Remote);
    assert_eq!(loaded.value, default_catalog());
    assert_eq!(shop.storage.products().unwrap(), default_catalog());
}

#[tokio::test]
async fn test_catalog_falls_back_to_last_snapshot_on_server_error() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    let shop = stub.storefront().unwrap();
    shop.catalog.load_products().await.unwrap();

    stub.set_outage(Some(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let loaded = shop.catalog.load_products().await.unwrap();

    assert_eq!(loaded.origin, Origin::Local);
    assert_eq!(loaded.value, default_catalog());
}

#[tokio::test]
async fn test_catalog_without_snapshot_falls_back_to_empty() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    stub.set_outage(Some(StatusCode::SERVICE_UNAVAILABLE)).await;
    let shop = stub.storefront().unwrap();

    let loaded = shop.catalog.load_products().await.unwrap();

    assert_eq!(loaded.origin, Origin::Local);
    assert!(loaded.value.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_initializes_default_catalog() {
    let api = ApiClient::new(unreachable_url().await.unwrap(), TEST_TIMEOUT).unwrap();
    let shop = Storefront::new(MemoryStore::new(), api, None);

    let loaded = shop.catalog.initialize_products().await.unwrap();

    assert_eq!(loaded.origin, Origin::Local);
    assert_eq!(loaded.value.len(), default_catalog().len());
    assert_eq!(shop.storage.products().unwrap(), loaded.value);
}

#[tokio::test]
async fn test_product_writes_reach_server_and_mirror() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    let shop = stub.storefront().unwrap();
    shop.catalog.load_products().await.unwrap();

    let created = shop
        .catalog
        .add_product(NewProduct {
            name: "USB-C Dock".to_owned(),
            price: Decimal::new(4999, 2),
            category: "Accessories".to_owned(),
            ..NewProduct::default()
        })
        .await
        .unwrap();
    assert_eq!(created.origin, Origin::Remote);
    assert!(stub.products().await.iter().any(|p| p.id == created.value.id));
    assert!(
        shop.storage
            .products()
            .unwrap()
            .iter()
            .any(|p| p.id == created.value.id)
    );

    let update = ProductUpdate {
        price: Some(Decimal::new(3999, 2)),
        ..ProductUpdate::default()
    };
    let updated = shop
        .catalog
        .update_product(&created.value.id, &update)
        .await
        .unwrap();
    assert_eq!(updated.origin, Origin::Remote);
    assert_eq!(updated.value.price, Decimal::new(3999, 2));

    let deleted = shop.catalog.delete_product(&created.value.id).await.unwrap();
    assert_eq!(deleted.origin, Origin::Remote);
    assert!(!stub.products().await.iter().any(|p| p.id == created.value.id));
}

#[tokio::test]
async fn test_product_writes_during_outage_stay_local() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    let shop = stub.storefront().unwrap();
    shop.catalog.load_products().await.unwrap();
    stub.set_outage(Some(StatusCode::BAD_GATEWAY)).await;

    let created = shop
        .catalog
        .add_product(NewProduct {
            name: "Offline Cable".to_owned(),
            price: Decimal::new(599, 2),
            ..NewProduct::default()
        })
        .await
        .unwrap();

    assert_eq!(created.origin, Origin::Local);
    assert_eq!(stub.products().await.len(), default_catalog().len());
    assert_eq!(
        shop.storage.products().unwrap().len(),
        default_catalog().len() + 1
    );

    let missing = shop
        .catalog
        .delete_product(&ProductId::new("prod_missing"))
        .await
        .unwrap_err();
    assert!(matches!(missing, SyncError::NotFound(_)));
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_login_and_profile() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let shop = stub.storefront().unwrap();

    let user = shop
        .accounts
        .register(&registration("asha", "correct-horse"))
        .await
        .unwrap();
    assert_eq!(user.username.as_str(), "asha");
    assert!(shop.accounts.is_authenticated().unwrap());

    shop.accounts.logout().unwrap();
    assert!(!shop.accounts.is_authenticated().unwrap());

    let wrong = shop
        .accounts
        .login(&Username::new("asha"), "battery-staple")
        .await
        .unwrap_err();
    assert!(matches!(wrong, SyncError::Rejected { status: 401, .. }));
    assert!(!shop.accounts.is_authenticated().unwrap());

    shop.accounts
        .login(&Username::new("asha"), "correct-horse")
        .await
        .unwrap();
    let profile = shop
        .accounts
        .get_profile(&Username::new("asha"))
        .await
        .unwrap();
    assert_eq!(profile.origin, Origin::Remote);
    assert_eq!(profile.value.full_name, "Asha Rao");
}

#[tokio::test]
async fn test_duplicate_registration_is_not_masked() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let shop = stub.storefront().unwrap();
    shop.accounts
        .register(&registration("asha", "correct-horse"))
        .await
        .unwrap();

    let err = shop
        .accounts
        .register(&registration("asha", "another-pass"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Rejected { status: 400, .. }));
    assert_eq!(err.user_message(), "Username already exists");
}

#[tokio::test]
async fn test_profile_falls_back_to_session_during_outage() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let shop = stub.storefront().unwrap();
    shop.accounts
        .register(&registration("asha", "correct-horse"))
        .await
        .unwrap();

    stub.set_outage(Some(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let profile = shop
        .accounts
        .get_profile(&Username::new("asha"))
        .await
        .unwrap();

    assert_eq!(profile.origin, Origin::Local);
    assert_eq!(profile.value.email, "asha@example.com");

    let login = shop
        .accounts
        .login(&Username::new("asha"), "correct-horse")
        .await
        .unwrap_err();
    assert!(matches!(login, SyncError::Unavailable(_)));
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_login_prefers_server() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    stub.add_admin("ops", "server-secret").await;
    let shop = stub.storefront().unwrap();

    let session = shop
        .admin
        .login(&AdminUserId::new("ops"), "server-secret")
        .await
        .unwrap();

    assert_eq!(session.origin, Origin::Remote);
    assert!(shop.admin.is_authenticated().unwrap());
}

#[tokio::test]
async fn test_admin_login_uses_local_admins_only_when_server_is_down() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let shop = stub.storefront().unwrap();
    let userid = AdminUserId::new("ops");
    shop.admin.register_local_admin(&userid, "local-secret").unwrap();

    // The server knows no such admin; its 401 is final.
    let rejected = shop.admin.login(&userid, "local-secret").await.unwrap_err();
    assert!(matches!(rejected, SyncError::Rejected { status: 401, .. }));
    assert!(!shop.admin.is_authenticated().unwrap());

    stub.set_outage(Some(StatusCode::SERVICE_UNAVAILABLE)).await;
    let session = shop.admin.login(&userid, "local-secret").await.unwrap();
    assert_eq!(session.origin, Origin::Local);
    assert!(shop.admin.is_authenticated().unwrap());

    shop.admin.logout().unwrap();
    let wrong = shop.admin.login(&userid, "not-the-secret").await.unwrap_err();
    assert!(matches!(wrong, SyncError::Rejected { status: 401, .. }));
}

// ============================================================================
// Demo requests
// ============================================================================

fn demo_request(name: &str) -> NewDemoRequest {
    NewDemoRequest {
        name: name.to_owned(),
        phone: "+91 98450 00000".to_owned(),
        email: format!("{}@example.in", name.to_lowercase()),
        address: "Bengaluru".to_owned(),
        reason: "Office network refresh".to_owned(),
    }
}

#[tokio::test]
async fn test_demo_requests_are_stored_and_listed_newest_first() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let api = stub.client().unwrap();

    let first = api.submit_demo_request(&demo_request("Ravi")).await.unwrap();
    assert_eq!(first.name, "Ravi");
    assert_eq!(first.email.as_str(), "ravi@example.in");
    assert_eq!(first.status, DemoStatus::Pending);

    api.submit_demo_request(&demo_request("Meera")).await.unwrap();

    let listed = api.list_demo_requests().await.unwrap();
    let names: Vec<_> = listed.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Meera", "Ravi"]);
    assert!(
        listed
            .windows(2)
            .all(|pair| matches!(pair, [newer, older] if newer.created_at >= older.created_at))
    );
}

#[tokio::test]
async fn test_incomplete_demo_request_is_rejected() {
    let stub = StubServer::start(Vec::new()).await.unwrap();
    let api = stub.client().unwrap();

    let err = api
        .submit_demo_request(&NewDemoRequest {
            phone: String::new(),
            ..demo_request("Ravi")
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RemoteError::Status { status: 400, ref message } if message == "phone is required"
    ));
    assert!(api.list_demo_requests().await.unwrap().is_empty());
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_events_follow_mutations() {
    let stub = StubServer::start(default_catalog()).await.unwrap();
    let shop = stub.storefront().unwrap();
    let products = shop.catalog.load_products().await.unwrap().into_inner();
    let hdd = products.iter().find(|p| p.id.as_str() == "prod_hdd_001").unwrap();

    let mut events = shop.cart.subscribe();

    shop.cart.add_item(hdd, 2).unwrap();
    let added = events.recv().await.unwrap();
    assert_eq!(added.item_count, 2);
    assert_eq!(added.total, Decimal::new(17998, 2));

    shop.cart.update_quantity(&hdd.id, 0).unwrap();
    let removed = events.recv().await.unwrap();
    assert_eq!(removed.item_count, 0);
    assert_eq!(removed.total, Decimal::ZERO);
}

#[tokio::test]
async fn test_file_backed_cart_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        api_url: unreachable_url().await.unwrap(),
        data_dir: dir.path().to_path_buf(),
        http_timeout: Duration::from_secs(1),
        currency: None,
    };

    let products = {
        let shop = Storefront::open(&config).unwrap();
        let products = shop.catalog.initialize_products().await.unwrap().into_inner();
        shop.cart.add_item(products.first().unwrap(), 3).unwrap();
        products
    };
    let first = products.first().unwrap();

    let reopened = Storefront::open(&config).unwrap();
    let cart = reopened.cart.cart().unwrap();
    assert_eq!(cart.item_count(), 3);
    assert_eq!(cart.total(), first.price * Decimal::from(3));
    assert_eq!(reopened.storage.products().unwrap(), products);
}
