//! Round trips against a real MongoDB. Run with
//! `TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`.

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use portal_service::models::{EventPatch, EventType, InvoiceItem, NewEvent, NewInvoice};
use portal_service::services::{EventService, InvoiceService, PortalDb};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn test_uri() -> String {
    std::env::var("TEST_MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

async fn setup() -> (PortalDb, String) {
    let db_name = format!("test_portal_{}", ObjectId::new().to_hex());
    let db = PortalDb::connect(&test_uri(), &db_name)
        .await
        .expect("Failed to connect to MongoDB");
    db.initialize_indexes()
        .await
        .expect("Failed to create indexes");
    (db, db_name)
}

async fn teardown(db_name: &str) {
    let client = mongodb::Client::with_uri_str(&test_uri()).await.unwrap();
    client.database(db_name).drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires MongoDB (set TEST_MONGODB_URI)"]
async fn events_and_invoices_persist_with_exact_money() {
    let (db, db_name) = setup().await;
    db.health_check().await.expect("ping failed");

    let events = EventService::new(Arc::new(db.event_repository()));
    let invoices = InvoiceService::new(Arc::new(db.invoice_repository()), events.clone());

    let ack = events
        .create(NewEvent {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            name: "Khan Wedding".to_string(),
            event_type: EventType::Wedding,
            expenses: dec!(150.10),
        })
        .await
        .unwrap();
    let event_id = ObjectId::parse_str(&ack.inserted_id).unwrap();

    let invoice = invoices
        .create_for_event(
            &event_id,
            NewInvoice {
                invoice_number: "INV-001".to_string(),
                client_name: "Sara Ahmed".to_string(),
                client_phone: "555-0101".to_string(),
                items: vec![
                    InvoiceItem::new("Stage", dec!(2), dec!(50)),
                    InvoiceItem::new("Lights", dec!(1), dec!(30)),
                ],
                discount: dec!(10),
            },
        )
        .await
        .unwrap();

    let stored = events.get(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.revenue, dec!(117));
    assert_eq!(stored.profit, dec!(-33.10));

    let ack = events
        .update(
            &event_id,
            EventPatch {
                name: Some("Khan Reception".to_string()),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ack.modified_count, 1);

    let invoice_id = ObjectId::parse_str(&invoice.inserted_id).unwrap();
    let listed = invoices.list_for_event(&event_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, invoice_id);

    invoices.delete(&invoice_id).await.unwrap();
    let stored = events.get(&event_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Khan Reception");
    assert!(stored.revenue.is_zero());

    teardown(&db_name).await;
}
