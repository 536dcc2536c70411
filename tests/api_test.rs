mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use kolonia::{api, auth::Actor, config::Settings, service::ServiceContext};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::*;

async fn app() -> (Router, Arc<ServiceContext>) {
    let ctx = Arc::new(setup().await);
    let app = api::create_app(ctx.clone(), Arc::new(Settings::default()));
    (app, ctx)
}

fn request(method: &str, uri: &str, actor: Option<&Actor>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        let role = if actor.is_admin() { "admin" } else { "guardian" };
        builder = builder
            .header("x-actor-id", actor.id.to_string())
            .header("x-actor-role", role);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn api_routes_require_an_actor() {
    let (app, _) = app().await;
    let response = app
        .oneshot(request("GET", "/api/trips", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_is_open() {
    let (app, _) = app().await;
    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn guardians_cannot_create_trips() {
    let (app, _) = app().await;
    let guardian = guardian_actor(Uuid::new_v4());
    let response = app
        .oneshot(request(
            "POST",
            "/api/trips",
            Some(&guardian),
            Some(json!({
                "title": "Sneaky trip",
                "location": "Nowhere",
                "departure_at": "2026-07-01T08:00:00Z",
                "return_at": "2026-07-14T18:00:00Z",
                "primary_stop": "A",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn trip_with_return_before_departure_is_rejected() {
    let (app, _) = app().await;
    let admin = admin();
    let response = app
        .oneshot(request(
            "POST",
            "/api/trips",
            Some(&admin),
            Some(json!({
                "title": "Backwards trip",
                "location": "Zakopane",
                "departure_at": "2026-07-14T08:00:00Z",
                "return_at": "2026-07-01T18:00:00Z",
                "primary_stop": "Warszawa Centralna",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn legacy_note_prefix_becomes_a_departure_stop() {
    let (app, ctx) = app().await;
    let trip = create_trip(&ctx).await;
    let (guardian, participant) = create_family(&ctx, 2014).await;
    let guardian = guardian_actor(guardian.id);

    let uri = format!(
        "/api/trips/{}/participants/{}/status",
        trip.id, participant.id
    );
    let response = app
        .oneshot(request(
            "POST",
            &uri,
            Some(&guardian),
            Some(json!({
                "status": "Confirmed",
                "note": "[STOP2] will board with a sibling",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["departure_stop"], "Stop2");
    assert_eq!(body["participation_note"], "will board with a sibling");
    // Old clients keep reading the prefixed form.
    assert_eq!(body["legacy_note"], "[STOP2] will board with a sibling");
}

#[tokio::test]
async fn recording_a_receipt_over_http_updates_the_payment() {
    let (app, ctx) = app().await;
    let admin = admin();
    let trip = create_trip(&ctx).await;
    installment_template(&ctx, trip.id, 1, 50_000, Some(date(2027, 3, 1))).await;
    let (_, participant) = create_family(&ctx, 2014).await;

    let registration = ctx
        .participation_service
        .set_status(
            &admin,
            trip.id,
            participant.id,
            kolonia::domain::ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();
    let payment = ctx
        .payment_repo
        .list_by_registration(registration.id)
        .await
        .unwrap()
        .remove(0);

    let uri = format!("/api/payments/{}/transactions", payment.id);
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            Some(&admin),
            Some(json!({
                "amount_cents": 30_000,
                "currency": "PLN",
                "paid_on": "2026-02-01",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "PartiallyPaid");
    assert_eq!(body["amount_paid_cents"], 30_000);

    // Zero-amount receipts never reach the ledger.
    let response = app
        .oneshot(request(
            "POST",
            &uri,
            Some(&admin),
            Some(json!({
                "amount_cents": 0,
                "currency": "PLN",
                "paid_on": "2026-02-01",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn guardians_cannot_read_foreign_payment_lists() {
    let (app, ctx) = app().await;
    let admin = admin();
    let trip = create_trip(&ctx).await;
    installment_template(&ctx, trip.id, 1, 50_000, None).await;
    let (_, participant) = create_family(&ctx, 2014).await;

    let registration = ctx
        .participation_service
        .set_status(
            &admin,
            trip.id,
            participant.id,
            kolonia::domain::ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();

    let stranger = guardian_actor(Uuid::new_v4());
    let uri = format!("/api/registrations/{}/payments", registration.id);
    let response = app
        .oneshot(request("GET", &uri, Some(&stranger), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
