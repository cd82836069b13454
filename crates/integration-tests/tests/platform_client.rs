//! `PlatformClient` against the stub platform: filters, caching, errors.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use arthive_core::{Email, ProductId, ProductStatus};
use arthive_integration_tests::{
    StubPlatform, TEST_ANON_KEY, TEST_PASSWORD, spawn_stub_platform, test_config,
};
use arthive_storefront::platform::{PlatformClient, PlatformError};

async fn client() -> (StubPlatform, PlatformClient) {
    let platform = spawn_stub_platform().await;
    let client = PlatformClient::new(&test_config(&platform.url).platform);
    (platform, client)
}

#[tokio::test]
async fn test_list_products_only_approved_and_cached() {
    let (platform, client) = client().await;

    let first = client.list_products().await.unwrap();
    let second = client.list_products().await.unwrap();

    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|p| p.status == ProductStatus::Approved));
    assert_eq!(second.len(), first.len());
    assert_eq!(platform.get_hits("products"), 1);
    assert_eq!(platform.last_apikey().as_deref(), Some(TEST_ANON_KEY));
}

#[tokio::test]
async fn test_invalidate_catalog_refetches() {
    let (platform, client) = client().await;

    client.list_products().await.unwrap();
    client.invalidate_catalog().await;
    client.list_products().await.unwrap();

    assert_eq!(platform.get_hits("products"), 2);
}

#[tokio::test]
async fn test_featured_products() {
    let (_platform, client) = client().await;
    let featured = client.featured_products().await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].id.as_str(), "p1");
}

#[tokio::test]
async fn test_get_product_missing_is_not_found() {
    let (_platform, client) = client().await;

    let product = client.get_product(&ProductId::new("p3")).await.unwrap();
    assert_eq!(product.status, ProductStatus::Pending);

    let err = client
        .get_product(&ProductId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));
}

#[tokio::test]
async fn test_colony_products_skip_unapproved() {
    let (_platform, client) = client().await;

    let colony = client.get_colony("coastal").await.unwrap();
    assert_eq!(colony.name, "Coastal");

    let products = client.colony_products(&colony).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id.as_str(), "p1");

    let err = client.get_colony("inland").await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));
}

#[tokio::test]
async fn test_sign_in() {
    let (_platform, client) = client().await;
    let email = Email::parse("maria@arthive.test").unwrap();

    let session = client
        .sign_in(&email, &SecretString::from(TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.user.id.as_str(), "u-artist");

    let err = client
        .sign_in(&email, &SecretString::from("wrong-password"))
        .await
        .unwrap_err();
    match err {
        PlatformError::Unauthorized(message) => {
            assert_eq!(message, "Invalid login credentials");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn test_username_available() {
    let (_platform, client) = client().await;
    assert!(!client.username_available("maria").await.unwrap());
    assert!(client.username_available("someone-new").await.unwrap());
}

#[tokio::test]
async fn test_set_product_status_updates_row_and_cache() {
    let (platform, client) = client().await;
    assert_eq!(client.list_products().await.unwrap().len(), 2);

    let product = client
        .set_product_status("token-u-admin", &ProductId::new("p3"), ProductStatus::Approved)
        .await
        .unwrap();
    assert_eq!(product.status, ProductStatus::Approved);

    let row = platform
        .rows("products")
        .into_iter()
        .find(|p| p["id"] == "p3")
        .unwrap();
    assert_eq!(row["status"], "approved");
    assert_eq!(client.list_products().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_user_by_token() {
    let (_platform, client) = client().await;

    let user = client.get_user("token-u-buyer").await.unwrap();
    assert_eq!(user.id.as_str(), "u-buyer");
    assert_eq!(user.email.as_deref(), Some("jose@arthive.test"));

    let err = client.get_user("expired").await.unwrap_err();
    assert!(matches!(err, PlatformError::Unauthorized(_)));
}
