use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    auth::Actor,
    domain::{
        ContractTemplate, CreatePaymentTemplateRequest, CreateTripRequest, PaymentTemplate,
        PaymentType, Trip, UpdateTripRequest, UpsertContractTemplateRequest,
    },
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// `active` or `completed`; anything else lists everything.
    pub filter: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Trip>>> {
    let trips = match params.filter.as_deref() {
        Some("active") => state.service_context.trip_repo.list_active().await?,
        Some("completed") => state.service_context.trip_repo.list_completed().await?,
        _ => state.service_context.trip_repo.list().await?,
    };
    Ok(Json(trips))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Trip>> {
    let trip = state
        .service_context
        .trip_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
    Ok(Json(trip))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>)> {
    actor.require_admin()?;
    if request.return_at < request.departure_at {
        return Err(AppError::Validation(
            "Return date must not precede departure".to_string(),
        ));
    }
    let trip = state.service_context.trip_repo.create(request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<Trip>> {
    actor.require_admin()?;
    let trip = state.service_context.trip_repo.update(id, request).await?;
    Ok(Json(trip))
}

/// Deleting a trip takes its registrations, payments, transactions and
/// contracts with it.
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    actor.require_admin()?;
    state
        .service_context
        .trip_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
    state.service_context.trip_repo.delete_cascade(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_payment_templates(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentTemplate>>> {
    let templates = state
        .service_context
        .payment_template_repo
        .list_by_trip(trip_id)
        .await?;
    Ok(Json(templates))
}

pub async fn create_payment_template(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreatePaymentTemplateRequest>,
) -> Result<(StatusCode, Json<PaymentTemplate>)> {
    actor.require_admin()?;
    state
        .service_context
        .trip_repo
        .find_by_id(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    if request.amount_cents < 0 {
        return Err(AppError::Validation(
            "Amount must not be negative".to_string(),
        ));
    }
    if request.payment_type == PaymentType::Installment && request.installment_number.is_none() {
        return Err(AppError::Validation(
            "Installments require an installment number".to_string(),
        ));
    }

    let template = state
        .service_context
        .payment_template_repo
        .create(trip_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn delete_payment_template(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    actor.require_admin()?;
    state
        .service_context
        .payment_template_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment template not found".to_string()))?;
    state.service_context.payment_template_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_contract_template(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<ContractTemplate>> {
    let template = state
        .service_context
        .contract_template_repo
        .find_by_trip(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contract template not found".to_string()))?;
    Ok(Json(template))
}

pub async fn upsert_contract_template(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<UpsertContractTemplateRequest>,
) -> Result<Json<ContractTemplate>> {
    actor.require_admin()?;
    state
        .service_context
        .trip_repo
        .find_by_id(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    let template = state
        .service_context
        .contract_template_repo
        .upsert(trip_id, request)
        .await?;
    Ok(Json(template))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PreviewRequest {
    #[validate(length(min = 1))]
    pub body: String,
}

/// Renders a draft contract body without persisting anything.
pub async fn preview_contract_template(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<serde_json::Value>> {
    actor.require_admin()?;
    request.validate()?;
    let rendered = state
        .service_context
        .contract_service
        .preview(trip_id, &request.body)
        .await?;
    Ok(Json(serde_json::json!({ "rendered": rendered })))
}
