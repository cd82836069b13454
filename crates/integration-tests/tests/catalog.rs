//! Catalog pages served from the stub platform.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;

use arthive_integration_tests::{spawn_storefront, spawn_stub_platform};

async fn get_json(url: String) -> (StatusCode, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_home_feed_shows_approved_with_artists() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;

    let (status, feed) = get_json(format!("{base}/")).await;
    assert_eq!(status, StatusCode::OK);

    let products = feed["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p["status"] == "approved"));
    assert!(products.iter().all(|p| p["artist_username"] == "maria"));

    let featured = feed["featured"].as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["id"], "p1");
}

#[tokio::test]
async fn test_pending_product_is_hidden_from_public() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;

    let (status, product) = get_json(format!("{base}/products/p1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["title"], "Harbor Print");

    let (status, body) = get_json(format!("{base}/products/p3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get_json(format!("{base}/products/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_colonies() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;

    let (status, colonies) = get_json(format!("{base}/colonies")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(colonies[0]["slug"], "coastal");

    let (status, detail) = get_json(format!("{base}/colonies/coastal")).await;
    assert_eq!(status, StatusCode::OK);
    let products = detail["products"].as_array().unwrap();
    assert_eq!(products.len(), 1, "pending products are filtered out");
    assert_eq!(products[0]["id"], "p1");

    let (status, _) = get_json(format!("{base}/colonies/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_artist_page_hides_email() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;

    let (status, page) = get_json(format!("{base}/artists/maria")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["profile"]["username"], "maria");
    assert!(page["profile"]["email"].is_null());
    assert_eq!(page["products"].as_array().unwrap().len(), 2);

    let (status, _) = get_json(format!("{base}/artists/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
