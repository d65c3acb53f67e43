mod common;

use axum::http::StatusCode;
use common::{body_json, invoice, wedding, TestApp};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

#[tokio::test]
async fn create_returns_an_insert_ack_with_the_document() {
    let app = TestApp::spawn();
    let token = app.login().await;

    let response = app.post_json("/events", Some(&token), wedding()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let ack = body_json(response).await;
    assert_eq!(ack["acknowledged"], true);
    let id = ack["inserted_id"].as_str().unwrap();
    assert!(ObjectId::parse_str(id).is_ok());

    let document = &ack["document"];
    assert_eq!(document["_id"], id);
    assert_eq!(document["name"], "Khan Wedding");
    assert_eq!(document["type"], "wedding");
    assert_eq!(document["date"], "2024-06-15");
    assert_eq!(document["expenses"], 150.5);
    assert_eq!(document["revenue"], 0.0);
    assert_eq!(document["profit"], -150.5);
}

#[tokio::test]
async fn expenses_may_be_sent_as_a_plain_number() {
    let app = TestApp::spawn();
    let token = app.login().await;

    let id = app
        .create_event(
            &token,
            json!({ "date": "2024-07-01", "name": "Aisha turns 5", "type": "birthday", "expenses": "75.25" }),
        )
        .await;
    let event = app.event(&token, &id).await;
    assert_eq!(event["expenses"], 75.25);
}

#[tokio::test]
async fn invalid_events_are_rejected() {
    let app = TestApp::spawn();
    let token = app.login().await;

    let cases = [
        json!({ "date": "", "name": "No date", "type": "wedding", "expenses": 0 }),
        json!({ "date": "15/06/2024", "name": "Bad date", "type": "wedding", "expenses": 0 }),
        json!({ "date": "2024-06-15", "name": "   ", "type": "wedding", "expenses": 0 }),
        json!({ "date": "2024-06-15", "name": "Bad type", "type": "gala", "expenses": 0 }),
        json!({
            "date": "2024-06-15",
            "name": "Too costly",
            "type": "wedding",
            "expenses": ["79228162514264337593543950335", "1"]
        }),
    ];
    for body in cases {
        let response = app.post_json("/events", Some(&token), body.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "accepted {}",
            body
        );
    }

    let listed = body_json(app.get("/events", Some(&token)).await).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn list_is_in_creation_order() {
    let app = TestApp::spawn();
    let token = app.login().await;

    let first = app.create_event(&token, wedding()).await;
    let second = app
        .create_event(
            &token,
            json!({ "date": "2023-01-01", "name": "Earlier date", "type": "custom", "expenses": [] }),
        )
        .await;

    let listed = body_json(app.get("/events", Some(&token)).await).await;
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn unknown_ids_read_as_null_and_write_as_zero_counts() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let missing = ObjectId::new().to_hex();

    let response = app.get(&format!("/events/{}", missing), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.is_null());

    let response = app
        .put_json(
            &format!("/events/{}", missing),
            Some(&token),
            json!({ "name": "Ghost" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["matched_count"], 0);
    assert_eq!(ack["modified_count"], 0);

    let response = app.delete(&format!("/events/{}", missing), Some(&token)).await;
    assert_eq!(body_json(response).await["deleted_count"], 0);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let response = app.get("/events/1712345678901", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_update_recomputes_profit_and_keeps_revenue() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let id = app.create_event(&token, wedding()).await;

    let response = app
        .post_json(&format!("/events/{}/invoices", id), Some(&token), invoice("INV-1"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .put_json(
            &format!("/events/{}", id),
            Some(&token),
            json!({ "expenses": [{ "description": "Everything", "amount": 17 }] }),
        )
        .await;
    let ack = body_json(response).await;
    assert_eq!(ack["matched_count"], 1);
    assert_eq!(ack["modified_count"], 1);

    let event = app.event(&token, &id).await;
    assert_eq!(event["name"], "Khan Wedding");
    assert_eq!(event["expenses"], 17.0);
    assert_eq!(event["revenue"], 117.0);
    assert_eq!(event["profit"], 100.0);
}

#[tokio::test]
async fn renaming_leaves_profit_alone() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let id = app.create_event(&token, wedding()).await;

    app.put_json(
        &format!("/events/{}", id),
        Some(&token),
        json!({ "name": "Khan Reception", "type": "anniversary", "date": "2025-01-02" }),
    )
    .await;

    let event = app.event(&token, &id).await;
    assert_eq!(event["name"], "Khan Reception");
    assert_eq!(event["type"], "anniversary");
    assert_eq!(event["date"], "2025-01-02");
    assert_eq!(event["profit"], -150.5);
}

#[tokio::test]
async fn invalid_update_fields_are_rejected() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let id = app.create_event(&token, wedding()).await;

    let response = app
        .put_json(&format!("/events/{}", id), Some(&token), json!({ "type": "gala" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let event = app.event(&token, &id).await;
    assert_eq!(event["type"], "wedding");
}

#[tokio::test]
async fn deleting_an_event_keeps_its_invoices() {
    let app = TestApp::spawn();
    let token = app.login().await;
    let id = app.create_event(&token, wedding()).await;
    app.post_json(&format!("/events/{}/invoices", id), Some(&token), invoice("INV-1"))
        .await;

    let response = app.delete(&format!("/events/{}", id), Some(&token)).await;
    let ack = body_json(response).await;
    assert_eq!(ack["acknowledged"], true);
    assert_eq!(ack["deleted_count"], 1);

    assert!(app.event(&token, &id).await.is_null());
    let invoices = body_json(app.get("/invoices", Some(&token)).await).await;
    let invoices = invoices.as_array().unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0]["event_name"], "Khan Wedding");
}
