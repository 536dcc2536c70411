pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .nest("/api", api_routes())
        .with_state(app_state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

/// Every /api route requires a resolved actor. Admin-only operations
/// additionally call `Actor::require_admin` before doing anything; guardian
/// operations run ownership checks in the service layer.
fn api_routes() -> Router<AppState> {
    Router::new()
        // Trips
        .route("/trips", get(handlers::trips::list).post(handlers::trips::create))
        .route(
            "/trips/:id",
            get(handlers::trips::get)
                .put(handlers::trips::update)
                .delete(handlers::trips::delete),
        )
        // Payment template catalog
        .route(
            "/trips/:id/payment-templates",
            get(handlers::trips::list_payment_templates)
                .post(handlers::trips::create_payment_template),
        )
        .route(
            "/payment-templates/:id",
            delete(handlers::trips::delete_payment_template),
        )
        // Contract template
        .route(
            "/trips/:id/contract-template",
            get(handlers::trips::get_contract_template)
                .put(handlers::trips::upsert_contract_template),
        )
        .route(
            "/trips/:id/contract-template/preview",
            post(handlers::trips::preview_contract_template),
        )
        // Participation state machine
        .route(
            "/trips/:trip_id/participants/:participant_id/status",
            post(handlers::registrations::set_status),
        )
        .route(
            "/trips/:trip_id/participants/:participant_id/registration",
            get(handlers::registrations::get),
        )
        .route(
            "/registrations/:id/payments",
            get(handlers::registrations::list_payments),
        )
        // Payment ledger
        .route(
            "/payments/:id/transactions",
            get(handlers::payments::list_transactions)
                .post(handlers::payments::record_transaction),
        )
        .route("/payments/:id/mark-paid", post(handlers::payments::mark_paid))
        .route("/payments/:id/status", put(handlers::payments::set_status))
        .route("/payments/:id/discount", put(handlers::payments::apply_discount))
        .route("/payments/:id/amount", put(handlers::payments::update_amount))
        // Contracts
        .route(
            "/contracts/by-trip/:trip_id/participant/:participant_id",
            get(handlers::contracts::get_for_participant),
        )
        .route("/contracts/:id/accept", post(handlers::contracts::accept))
        // People
        .route("/guardians", post(handlers::people::create_guardian))
        .route(
            "/participants",
            get(handlers::people::list_own_participants).post(handlers::people::create_participant),
        )
        .route("/participants/:id", get(handlers::people::get_participant))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_actor))
}
