//! Line item editing tests for invoice-editor.

mod common;

use common::{item_ids, test_config, total, TestApp};
use invoice_editor::services::RemovalPolicy;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn session_starts_with_seed_item() {
    let app = TestApp::spawn().await;

    let invoice = app.invoice().await;
    let items = invoice["items"].as_array().unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Consultation Services");
    assert_eq!(items[0]["quantity"], "1");
    assert_eq!(items[0]["rate"], "150");
    assert_eq!(total(&invoice, "total"), 150.0);
    assert!(invoice["invoice_no"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(invoice["currency"], "MYR");
    assert_eq!(invoice["save_state"], "idle");
}

#[tokio::test]
async fn add_item_appends_with_fresh_id() {
    let app = TestApp::spawn().await;
    let before = item_ids(&app.invoice().await);

    let first = app.add_item().await;
    let second = app.add_item().await;

    let invoice = app.invoice().await;
    let ids = item_ids(&invoice);
    assert_eq!(ids.len(), before.len() + 2);
    assert_eq!(ids[ids.len() - 2], first);
    assert_eq!(ids[ids.len() - 1], second);
    assert!(!before.contains(&first));
    assert_ne!(first, second);

    let added = &invoice["items"][ids.len() - 1];
    assert_eq!(added["description"], "");
    assert_eq!(added["quantity"], "0");
    assert_eq!(added["rate"], "0");
    assert_eq!(added["discount"], "0");
}

#[tokio::test]
async fn add_item_returns_created() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/invoice/items"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn partial_numeric_input_is_kept_raw() {
    let app = TestApp::spawn().await;
    let id = item_ids(&app.invoice().await)[0];

    let response = app.set_field(id, "rate", "12.").await;
    assert_eq!(response.status(), StatusCode::OK);
    let invoice: Value = response.json().await.unwrap();

    assert_eq!(invoice["items"][0]["rate"], "12.");
    assert_eq!(invoice["calculation"]["lines"][0]["amount"].as_f64(), Some(12.0));
}

#[tokio::test]
async fn non_numeric_input_counts_as_zero() {
    let app = TestApp::spawn().await;
    let id = item_ids(&app.invoice().await)[0];

    app.fill_item(id, "Mystery", "two", "150", "n/a").await;

    let invoice = app.invoice().await;
    assert_eq!(invoice["items"][0]["quantity"], "two");
    assert_eq!(total(&invoice, "subtotal"), 0.0);
    assert_eq!(total(&invoice, "discount"), 0.0);
    assert_eq!(total(&invoice, "total"), 0.0);
}

#[tokio::test]
async fn update_unknown_item_is_noop() {
    let app = TestApp::spawn().await;
    let before = app.invoice().await;
    let unknown = item_ids(&before)[0] + 12345;

    let response = app.set_field(unknown, "quantity", "9").await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = app.invoice().await;
    assert_eq!(before["items"], after["items"]);
}

#[tokio::test]
async fn update_unknown_field_is_rejected() {
    let app = TestApp::spawn().await;
    let id = item_ids(&app.invoice().await)[0];

    let response = app.set_field(id, "colour", "blue").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn qty_alias_updates_quantity() {
    let app = TestApp::spawn().await;
    let id = item_ids(&app.invoice().await)[0];

    app.set_field(id, "qty", "3").await;

    let invoice = app.invoice().await;
    assert_eq!(invoice["items"][0]["quantity"], "3");
    assert_eq!(total(&invoice, "subtotal"), 450.0);
}

#[tokio::test]
async fn remove_item_leaves_other_lines_alone() {
    let app = TestApp::spawn().await;
    let seed = item_ids(&app.invoice().await)[0];
    let middle = app.add_item().await;
    let last = app.add_item().await;
    app.fill_item(middle, "Travel", "1", "80", "5").await;
    app.fill_item(last, "Hosting", "12", "9.5", "0").await;

    let before = app.invoice().await;
    let invoice = app.remove_item(middle).await;

    assert_eq!(item_ids(&invoice), vec![seed, last]);
    let amounts = |v: &Value| -> Vec<(u64, f64)> {
        v["calculation"]["lines"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|line| line["id"].as_u64() != Some(middle))
            .map(|line| (line["id"].as_u64().unwrap(), line["amount"].as_f64().unwrap()))
            .collect()
    };
    assert_eq!(amounts(&before), amounts(&invoice));
    assert_eq!(total(&invoice, "total"), 150.0 + 114.0);
}

#[tokio::test]
async fn last_item_is_kept_by_default() {
    let app = TestApp::spawn().await;
    let seed = item_ids(&app.invoice().await)[0];

    let invoice = app.remove_item(seed).await;

    assert_eq!(item_ids(&invoice), vec![seed]);
}

#[tokio::test]
async fn allow_empty_policy_removes_last_item() {
    let mut config = test_config();
    config.editor.removal_policy = RemovalPolicy::AllowEmpty;
    let app = TestApp::spawn_with(config, true).await;
    let seed = item_ids(&app.invoice().await)[0];

    let invoice = app.remove_item(seed).await;

    assert!(item_ids(&invoice).is_empty());
    assert_eq!(total(&invoice, "total"), 0.0);

    let html = app
        .client
        .get(app.url("/invoice/print"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("No items added."));
}

#[tokio::test]
async fn unseeded_session_starts_empty() {
    let mut config = test_config();
    config.editor.seed_first_item = false;
    let app = TestApp::spawn_with(config, true).await;

    let invoice = app.invoice().await;
    assert!(item_ids(&invoice).is_empty());
}
