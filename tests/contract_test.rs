mod common;

use chrono::{Datelike, Utc};
use kolonia::{
    domain::{ParticipationStatus, UpsertContractTemplateRequest},
    error::AppError,
    service::ServiceContext,
};
use uuid::Uuid;

use common::*;

const TEMPLATE_BODY: &str = "\
Contract {{contract_number}} for {{child_name}} ({{child_birth_date}})
Guardian: {{guardian_name}}
Trip: {{trip_title}}, {{trip_location}}, {{departure_date}} to {{return_date}}
Schedule:
{{payment_schedule}}
Accounts:
{{bank_accounts}}";

async fn activate_template(ctx: &ServiceContext, trip_id: Uuid, body: &str) {
    ctx.contract_template_repo
        .upsert(
            trip_id,
            UpsertContractTemplateRequest {
                body: body.to_string(),
                is_active: true,
            },
        )
        .await
        .unwrap();
}

async fn confirm(ctx: &ServiceContext, trip_id: Uuid, participant_id: Uuid) {
    ctx.participation_service
        .set_status(
            &admin(),
            trip_id,
            participant_id,
            ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn confirmation_issues_a_filled_contract() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    installment_template(&ctx, trip.id, 1, 50_000, Some(date(2027, 3, 1))).await;
    activate_template(&ctx, trip.id, TEMPLATE_BODY).await;
    let (guardian, participant) = create_family(&ctx, 2014).await;

    confirm(&ctx, trip.id, participant.id).await;

    let contract = ctx
        .contract_repo
        .find_by_trip_and_participant(trip.id, participant.id)
        .await
        .unwrap()
        .expect("contract issued on confirmation");
    assert_eq!(contract.contract_number, format!("1/{}", Utc::now().year()));
    assert!(contract.body.contains(&participant.full_name()));
    assert!(contract.body.contains(&guardian.full_name()));
    assert!(contract.body.contains(&trip.title));
    assert!(contract.body.contains("Installment 1"));
    assert!(contract.body.contains("500.00 PLN"));
    assert!(!contract.body.contains("{{"));
}

#[tokio::test]
async fn contract_numbers_increment_within_a_year() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    activate_template(&ctx, trip.id, TEMPLATE_BODY).await;

    let year = Utc::now().year();
    for expected in 1..=3 {
        let (_, participant) = create_family(&ctx, 2014).await;
        confirm(&ctx, trip.id, participant.id).await;
        let contract = ctx
            .contract_repo
            .find_by_trip_and_participant(trip.id, participant.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.contract_number, format!("{}/{}", expected, year));
    }
}

#[tokio::test]
async fn issued_contracts_survive_template_edits() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    activate_template(&ctx, trip.id, TEMPLATE_BODY).await;
    let (_, participant) = create_family(&ctx, 2014).await;

    confirm(&ctx, trip.id, participant.id).await;
    let issued = ctx
        .contract_repo
        .find_by_trip_and_participant(trip.id, participant.id)
        .await
        .unwrap()
        .unwrap();

    activate_template(&ctx, trip.id, "Completely different text").await;
    confirm(&ctx, trip.id, participant.id).await;

    let after = ctx
        .contract_repo
        .find_by_trip_and_participant(trip.id, participant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, issued.id);
    assert_eq!(after.body, issued.body);
}

#[tokio::test]
async fn inactive_template_blocks_issuance() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    ctx.contract_template_repo
        .upsert(
            trip.id,
            UpsertContractTemplateRequest {
                body: TEMPLATE_BODY.to_string(),
                is_active: false,
            },
        )
        .await
        .unwrap();
    let (_, participant) = create_family(&ctx, 2014).await;

    confirm(&ctx, trip.id, participant.id).await;

    let contract = ctx
        .contract_repo
        .find_by_trip_and_participant(trip.id, participant.id)
        .await
        .unwrap();
    assert!(contract.is_none());
}

#[tokio::test]
async fn acceptance_is_owner_only_and_one_shot() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    activate_template(&ctx, trip.id, TEMPLATE_BODY).await;
    let (guardian, participant) = create_family(&ctx, 2014).await;
    confirm(&ctx, trip.id, participant.id).await;

    let contract = ctx
        .contract_repo
        .find_by_trip_and_participant(trip.id, participant.id)
        .await
        .unwrap()
        .unwrap();

    let stranger = guardian_actor(Uuid::new_v4());
    let err = ctx
        .contract_service
        .accept(&stranger, contract.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let owner = guardian_actor(guardian.id);
    let accepted = ctx
        .contract_service
        .accept(&owner, contract.id)
        .await
        .unwrap();
    assert!(accepted.accepted_at.is_some());
    assert_eq!(accepted.accepted_by, Some(guardian.id));

    let err = ctx
        .contract_service
        .accept(&owner, contract.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn preview_without_registrations_keeps_person_tokens() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    installment_template(&ctx, trip.id, 1, 50_000, None).await;

    let rendered = ctx
        .contract_service
        .preview(trip.id, TEMPLATE_BODY)
        .await
        .unwrap();

    assert!(rendered.contains(&trip.title));
    assert!(rendered.contains("Installment 1"));
    // Person placeholders stay visible when there is nobody to render; the
    // number slot reads the same as in the registration-backed preview.
    assert!(rendered.contains("{{guardian_name}}"));
    assert!(rendered.contains("(assigned on issue)"));

    // Preview persists nothing and allocates no contract number.
    let next = ctx
        .contract_repo
        .next_contract_number(Utc::now().year())
        .await
        .unwrap();
    assert_eq!(next, 1);
}

#[tokio::test]
async fn preview_uses_the_first_active_registration() {
    let ctx = setup().await;
    let trip = create_trip(&ctx).await;
    let (_, participant) = create_family(&ctx, 2014).await;
    confirm(&ctx, trip.id, participant.id).await;

    let rendered = ctx
        .contract_service
        .preview(trip.id, "{{child_name}} / {{contract_number}}")
        .await
        .unwrap();
    assert!(rendered.contains(&participant.full_name()));
    assert!(rendered.contains("(assigned on issue)"));
}
