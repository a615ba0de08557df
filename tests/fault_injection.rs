//! Fault injection across the checkout chain.

use std::sync::Arc;
use std::time::Duration;

use storefront::chaos::RiggedDice;
use storefront::payment::BehaviorProfile;

mod common;
use common::{client, spawn_stack, StackOptions};

#[tokio::test]
async fn error_drill_answers_500_immediately() {
    let stack = spawn_stack(StackOptions::default()).await;
    let client = client();

    let res = client
        .post(format!("{}/simulate-failure", stack.payment_url))
        .json(&serde_json::json!({ "type": "error" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Simulated error");
}

#[tokio::test]
async fn unknown_drill_type_is_rejected() {
    let stack = spawn_stack(StackOptions::default()).await;
    let client = client();

    let res = client
        .post(format!("{}/simulate-failure", stack.payment_url))
        .json(&serde_json::json!({ "type": "meltdown" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Unknown failure type");
}

#[tokio::test]
async fn timeout_drill_hangs_past_the_client_budget() {
    let stack = spawn_stack(StackOptions::default()).await;
    let client = client();

    let err = client
        .post(format!("{}/simulate-failure", stack.payment_url))
        .json(&serde_json::json!({ "type": "timeout" }))
        .timeout(Duration::from_millis(500))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn unreachable_payment_maps_to_503_and_preserves_the_cart() {
    let mut options = StackOptions::default();
    options.payment_up = false;
    let stack = spawn_stack(options).await;
    let client = client();

    client
        .post(format!("{}/cart/erin/add", stack.cart_url))
        .json(&serde_json::json!({ "product_id": 4 }))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/api/checkout/erin", stack.gateway_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: serde_json::Value = res.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with("Payment service error"),
        "unexpected error: {error}"
    );
    assert!(body["gateway_processing_time"].is_number());

    let res = client
        .get(format!("{}/cart/erin", stack.cart_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cart"]["total"], 599.0);
}

#[tokio::test]
async fn slow_payment_surfaces_as_504_and_preserves_the_cart() {
    let mut options = StackOptions::default();
    options.payment_profile = BehaviorProfile {
        version: "v1".to_string(),
        failure_rate: 0.0,
        latency_min: Duration::from_secs(2),
        latency_max: Duration::from_secs(2),
    };
    options.payment_timeout = Duration::from_millis(300);
    let stack = spawn_stack(options).await;
    let client = client();

    client
        .post(format!("{}/cart/frank/add", stack.cart_url))
        .json(&serde_json::json!({ "product_id": 5 }))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/cart/frank/checkout", stack.cart_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Payment service timeout");

    let res = client
        .get(format!("{}/cart/frank", stack.cart_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_chaos_gate_fires_independently_of_payment() {
    let mut options = StackOptions::default();
    options.cart_dice = Arc::new(RiggedDice::always_fail(0));
    options.checkout_failure_rate = 1.0;
    let stack = spawn_stack(options).await;
    let client = client();

    client
        .post(format!("{}/cart/grace/add", stack.cart_url))
        .json(&serde_json::json!({ "product_id": 1 }))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/cart/grace/checkout", stack.cart_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Checkout temporarily unavailable");

    // The payment ledger saw nothing.
    let res = client
        .get(format!("{}/metrics", stack.payment_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total_payments"], 0);
}

#[tokio::test]
async fn gateway_normalizes_a_dead_catalog_to_503() {
    let mut options = StackOptions::default();
    options.catalog_up = false;
    let stack = spawn_stack(options).await;
    let client = client();

    let res = client
        .get(format!("{}/api/products", stack.gateway_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: serde_json::Value = res.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with("Catalog service error"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn aggregate_health_reports_dead_services_as_unreachable() {
    let mut options = StackOptions::default();
    options.payment_up = false;
    let stack = spawn_stack(options).await;
    let client = client();

    let res = client
        .get(format!("{}/metrics", stack.gateway_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["services"]["catalog"]["status"], "healthy");
    assert_eq!(body["services"]["cart"]["status"], "healthy");
    assert_eq!(body["services"]["payment"]["status"], "unreachable");
    assert!(body["timestamp"].is_number());
}

#[tokio::test]
async fn concurrent_adds_for_two_products_both_persist() {
    let stack = spawn_stack(StackOptions::default()).await;
    let client = client();

    let mut handles = Vec::new();
    for product_id in [1u32, 3u32] {
        let client = client.clone();
        let url = format!("{}/cart/henry/add", stack.cart_url);
        handles.push(tokio::spawn(async move {
            client
                .post(&url)
                .json(&serde_json::json!({ "product_id": product_id }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let res = client
        .get(format!("{}/cart/henry", stack.cart_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["cart"]["total"], 999.0 + 249.0);
}
