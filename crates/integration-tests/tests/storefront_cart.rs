//! Cart behaviour over HTTP, across requests sharing a session cookie.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::Value;

use arthive_integration_tests::{spawn_storefront, spawn_stub_platform};

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

async fn post_form(client: &Client, url: String, form: &[(&str, &str)]) -> Value {
    let resp = client.post(url).form(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

async fn add(client: &Client, base: &str, id: &str, price: &str, quantity: &str) -> Value {
    let title = format!("Art {id}");
    let image_url = format!("/img/{id}.jpg");
    post_form(
        client,
        format!("{base}/cart/add"),
        &[
            ("id", id),
            ("title", title.as_str()),
            ("price", price),
            ("image_url", image_url.as_str()),
            ("quantity", quantity),
        ],
    )
    .await
}

async fn count(client: &Client, base: &str) -> u64 {
    let body: Value = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["count"].as_u64().unwrap()
}

#[tokio::test]
async fn test_cart_scenario_totals() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let client = client();

    add(&client, &base, "a", "100", "1").await;
    let cart = add(&client, &base, "b", "50", "2").await;

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "a");
    assert_eq!(items[0]["quantity"], 1);
    assert_eq!(items[1]["id"], "b");
    assert_eq!(items[1]["quantity"], 2);
    assert_eq!(cart["total"], 200.0);
    assert_eq!(cart["item_count"], 3);

    let shown: Value = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shown, cart);
}

#[tokio::test]
async fn test_repeat_add_merges_quantities() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let client = client();

    add(&client, &base, "p1", "100", "2").await;
    let cart = add(&client, &base, "p1", "100", "3").await;

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(count(&client, &base).await, 5);
}

#[tokio::test]
async fn test_update_remove_and_clear() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let client = client();

    add(&client, &base, "p1", "100", "1").await;
    add(&client, &base, "p2", "50", "1").await;

    let cart = post_form(
        &client,
        format!("{base}/cart/update"),
        &[("id", "p2"), ("quantity", "4")],
    )
    .await;
    assert_eq!(cart["items"][1]["quantity"], 4);

    // Unknown IDs leave the cart untouched
    let unchanged =
        post_form(&client, format!("{base}/cart/remove"), &[("id", "nonexistent")]).await;
    assert_eq!(unchanged, cart);

    let cart = post_form(&client, format!("{base}/cart/remove"), &[("id", "p1")]).await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "p2");

    let cart = post_form(
        &client,
        format!("{base}/cart/update"),
        &[("id", "p2"), ("quantity", "0")],
    )
    .await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    add(&client, &base, "p1", "100", "1").await;
    let cart = post_form(&client, format!("{base}/cart/clear"), &[]).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(count(&client, &base).await, 0);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let alice = client();
    let bob = client();

    add(&alice, &base, "p1", "100", "2").await;

    assert_eq!(count(&alice, &base).await, 2);
    assert_eq!(count(&bob, &base).await, 0);
}

#[tokio::test]
async fn test_zero_quantity_add_is_rejected() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let client = client();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("id", "p1"), ("title", "T"), ("price", "10"), ("quantity", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    assert_eq!(count(&client, &base).await, 0);
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;

    let resp = client()
        .post(format!("{base}/cart/add"))
        .form(&[("id", "p1"), ("title", "T"), ("price", "-10")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_quantity_fails_form_decoding() {
    let platform = spawn_stub_platform().await;
    let base = spawn_storefront(&platform).await;
    let client = client();

    add(&client, &base, "a", "100", "1").await;

    // Quantities are unsigned, so the form itself does not decode
    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("id", "b"), ("title", "T"), ("price", "10"), ("quantity", "-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = client
        .post(format!("{base}/cart/update"))
        .form(&[("id", "a"), ("quantity", "-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(count(&client, &base).await, 1);
}
