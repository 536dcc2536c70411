use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    auth::Actor,
    domain::{Currency, Payment, PaymentMethod, PaymentStatus, PaymentTransaction},
    error::Result,
    service::payment_ledger::RecordTransactionRequest,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RecordTransactionDto {
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub currency: Currency,
    pub paid_on: NaiveDate,
    pub method: Option<PaymentMethod>,
    pub note: Option<String>,
}

pub async fn record_transaction(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<RecordTransactionDto>,
) -> Result<Json<Payment>> {
    actor.require_admin()?;
    dto.validate()?;
    let payment = state
        .service_context
        .payment_ledger
        .record_transaction(
            &actor,
            payment_id,
            RecordTransactionRequest {
                amount_cents: dto.amount_cents,
                currency: dto.currency,
                paid_on: dto.paid_on,
                method: dto.method,
                note: dto.note,
            },
        )
        .await?;
    Ok(Json(payment))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentTransaction>>> {
    actor.require_admin()?;
    let transactions = state
        .service_context
        .payment_ledger
        .list_transactions(payment_id)
        .await?;
    Ok(Json(transactions))
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub method: Option<PaymentMethod>,
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<Payment>> {
    actor.require_admin()?;
    let payment = state
        .service_context
        .payment_ledger
        .mark_fully_paid(&actor, payment_id, request.method)
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: PaymentStatus,
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Payment>> {
    actor.require_admin()?;
    let payment = state
        .service_context
        .payment_ledger
        .set_status(&actor, payment_id, request.status)
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyDiscountRequest {
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: f64,
}

pub async fn apply_discount(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<ApplyDiscountRequest>,
) -> Result<Json<Payment>> {
    actor.require_admin()?;
    request.validate()?;
    let payment = state
        .service_context
        .payment_ledger
        .apply_discount(payment_id, request.percentage)
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAmountRequest {
    #[validate(range(min = 0))]
    pub amount_cents: i64,
}

pub async fn update_amount(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<UpdateAmountRequest>,
) -> Result<Json<Payment>> {
    actor.require_admin()?;
    request.validate()?;
    let payment = state
        .service_context
        .payment_ledger
        .update_amount(payment_id, request.amount_cents)
        .await?;
    Ok(Json(payment))
}
