mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{body_text, location, TestApp, OPERATOR};
use portal_service::models::{EventType, NewEvent};
use rust_decimal_macros::dec;

async fn seed_event(app: &TestApp) -> String {
    let ack = app
        .state
        .events
        .create(NewEvent {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            name: "Khan Wedding".to_string(),
            event_type: EventType::Wedding,
            expenses: dec!(150),
        })
        .await
        .unwrap();
    ack.inserted_id
}

#[tokio::test]
async fn login_screen_renders_for_anonymous_visitors() {
    let app = TestApp::spawn();
    let response = app.get_page("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let csp = response.headers()["content-security-policy"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.starts_with("default-src 'self'"));

    let html = body_text(response).await;
    assert!(html.contains("<form method=\"post\" action=\"/login\">"));
}

#[tokio::test]
async fn dashboard_redirects_without_a_session() {
    let app = TestApp::spawn();
    for uri in ["/dashboard", "/dashboard?tab=invoices", "/dashboard/events/abc/edit"] {
        let response = app.get_page(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), Some("/"));
    }
}

#[tokio::test]
async fn bad_credentials_show_an_inline_error() {
    let app = TestApp::spawn();
    let response = app
        .post_form("/login", None, &format!("username={}&password=wrong", OPERATOR))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let html = body_text(response).await;
    assert!(html.contains("Invalid username or password"));
    assert!(html.contains(&format!("value=\"{}\"", OPERATOR)));
}

#[tokio::test]
async fn blank_credentials_are_not_checked() {
    let app = TestApp::spawn();
    let response = app.post_form("/login", None, "username=&password=").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn signed_in_operator_sees_the_dashboard() {
    let app = TestApp::spawn();
    seed_event(&app).await;
    let cookie = app.sign_in().await;

    let response = app.get_page("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));

    let response = app.get_page("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Khan Wedding"));
    assert!(html.contains("-$150.00"));
    assert!(html.contains("Add Event"));
}

#[tokio::test]
async fn unknown_tab_shows_the_events_list() {
    let app = TestApp::spawn();
    seed_event(&app).await;
    let cookie = app.sign_in().await;

    for uri in ["/dashboard?tab=bogus", "/dashboard?tab="] {
        let response = app.get_page(uri, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let html = body_text(response).await;
        assert!(html.contains(r#"<a href="/dashboard?tab=events" class="active">"#));
        assert!(html.contains("Add Event"));
    }
}

#[tokio::test]
async fn add_event_form_creates_and_redirects() {
    let app = TestApp::spawn();
    let cookie = app.sign_in().await;

    let body = "date=2024-09-01&name=Garden+Party&type=custom\
        &expense_description=Tent&expense_amount=120\
        &expense_description=Chairs&expense_amount=30.5\
        &expense_description=&expense_amount=\
        &intent=submit";
    let response = app.post_form("/dashboard/events", Some(&cookie), body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard?tab=events"));

    let events = app.state.events.list().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Garden Party");
    assert_eq!(events[0].expenses, dec!(150.5));
}

#[tokio::test]
async fn recalculate_and_add_row_keep_the_form_open() {
    let app = TestApp::spawn();
    let cookie = app.sign_in().await;

    let body = "date=2024-09-01&name=Garden+Party&type=custom\
        &expense_description=Tent&expense_amount=120\
        &expense_description=Chairs&expense_amount=30";
    let response = app
        .post_form(
            "/dashboard/events",
            Some(&cookie),
            &format!("{}&intent=recalculate", body),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("$150.00"));
    assert!(html.contains("value=\"Garden Party\""));

    let response = app
        .post_form(
            "/dashboard/events",
            Some(&cookie),
            &format!("{}&intent=add_row", body),
        )
        .await;
    let html = body_text(response).await;
    assert_eq!(html.matches("name=\"expense_amount\"").count(), 3);

    assert!(app.state.events.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_event_form_is_shown_again_with_errors() {
    let app = TestApp::spawn();
    let cookie = app.sign_in().await;

    let response = app
        .post_form(
            "/dashboard/events",
            Some(&cookie),
            "date=&name=Garden+Party&type=&intent=submit",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("value=\"Garden Party\""));
    assert!(app.state.events.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_event_page_updates_the_record() {
    let app = TestApp::spawn();
    let id = seed_event(&app).await;
    let cookie = app.sign_in().await;

    let response = app
        .get_page(&format!("/dashboard/events/{}/edit", id), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Update Event"));
    assert!(html.contains("value=\"Total Expenses\""));

    let body = "date=2024-06-16&name=Khan+Wedding+Reception&type=wedding\
        &expense_description=Total+Expenses&expense_amount=200&intent=submit";
    let response = app
        .post_form(&format!("/dashboard/events/{}", id), Some(&cookie), body)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let events = app.state.events.list().await.unwrap();
    assert_eq!(events[0].name, "Khan Wedding Reception");
    assert_eq!(events[0].expenses, dec!(200));
    assert_eq!(events[0].profit, dec!(-200));
}

#[tokio::test]
async fn unknown_event_shows_a_not_found_page() {
    let app = TestApp::spawn();
    let cookie = app.sign_in().await;
    let missing = mongodb::bson::oid::ObjectId::new().to_hex();

    let response = app
        .get_page(&format!("/dashboard/events/{}/edit", missing), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("Event not found"));
}

#[tokio::test]
async fn invoice_pages_create_edit_print_and_delete() {
    let app = TestApp::spawn();
    let event_id = seed_event(&app).await;
    let cookie = app.sign_in().await;

    let response = app
        .get_page(&format!("/dashboard/events/{}/invoices/new", event_id), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Khan Wedding"));

    let body = "invoice_number=INV-001&client_name=Sara+Ahmed&client_phone=555-0101\
        &item_description=Stage&item_quantity=2&item_rate=50\
        &item_description=Lights&item_quantity=1&item_rate=30\
        &discount=10&intent=submit";
    let response = app
        .post_form(
            &format!("/dashboard/events/{}/invoices/new", event_id),
            Some(&cookie),
            body,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard?tab=invoices"));

    let invoices = app.state.invoices.list().await.unwrap();
    assert_eq!(invoices.len(), 1);
    let invoice_id = invoices[0].id.to_hex();
    assert_eq!(invoices[0].total, dec!(117));
    let events = app.state.events.list().await.unwrap();
    assert_eq!(events[0].revenue, dec!(117));

    let response = app.get_page("/dashboard?tab=invoices", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains("INV-001"));
    assert!(html.contains("$117.00"));

    let response = app
        .get_page(&format!("/dashboard/invoices/{}/print", invoice_id), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("INVOICE"));
    assert!(html.contains("$130.00"));
    assert!(html.contains("-$13.00"));

    let response = app
        .get_page(&format!("/dashboard/invoices/{}/edit", invoice_id), Some(&cookie))
        .await;
    let html = body_text(response).await;
    assert!(html.contains("Update Invoice"));
    assert!(html.contains("value=\"INV-001\""));

    let edit = "invoice_number=INV-001&client_name=Sara+Ahmed&client_phone=555-0101\
        &item_description=Stage&item_quantity=2&item_rate=50\
        &item_description=Lights&item_quantity=1&item_rate=30\
        &discount=0&status=Paid&intent=submit";
    let response = app
        .post_form(&format!("/dashboard/invoices/{}", invoice_id), Some(&cookie), edit)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let events = app.state.events.list().await.unwrap();
    assert_eq!(events[0].revenue, dec!(130));

    let response = app
        .post_form(
            &format!("/dashboard/invoices/{}/delete", invoice_id),
            Some(&cookie),
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.state.invoices.list().await.unwrap().is_empty());
    let events = app.state.events.list().await.unwrap();
    assert_eq!(events[0].revenue, dec!(0));
}

#[tokio::test]
async fn delete_event_button_removes_the_event() {
    let app = TestApp::spawn();
    let id = seed_event(&app).await;
    let cookie = app.sign_in().await;

    let response = app
        .post_form(&format!("/dashboard/events/{}/delete", id), Some(&cookie), "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.state.events.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn();
    let cookie = app.sign_in().await;

    let response = app.post_form("/logout", Some(&cookie), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let response = app.get_page("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}
