//! The full lifecycle in one sitting: an admin sets up a trip with an
//! installment and an age-restricted season pass, a guardian's child is
//! confirmed, pays, and finally withdraws.

mod common;

use chrono::Utc;
use kolonia::domain::{
    Currency, ParticipationStatus, PaymentMethod, PaymentStatus, PaymentType,
};
use kolonia::service::payment_ledger::RecordTransactionRequest;

use common::*;

#[tokio::test]
async fn confirm_pay_withdraw() {
    let ctx = setup().await;
    let admin = admin();

    let trip = create_trip(&ctx).await;
    installment_template(&ctx, trip.id, 1, 50_000, Some(date(2025, 3, 1))).await;
    season_pass_template(&ctx, trip.id, 30_000, Some(2015), Some(2016)).await;

    let (guardian, participant) = create_family(&ctx, 2015).await;
    let guardian = guardian_actor(guardian.id);

    // Guardian confirms: both obligations apply to a child born in 2015.
    let registration = ctx
        .participation_service
        .set_status(
            &guardian,
            trip.id,
            participant.id,
            ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();

    let payments = ctx
        .payment_repo
        .list_by_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
    assert!(payments.iter().all(|p| p.status == PaymentStatus::Pending));

    // A bank transfer covers the installment in full.
    let installment = payments
        .iter()
        .find(|p| p.payment_type == PaymentType::Installment)
        .unwrap();
    let paid = ctx
        .payment_ledger
        .record_transaction(
            &admin,
            installment.id,
            RecordTransactionRequest {
                amount_cents: 50_000,
                currency: Currency::PLN,
                paid_on: Utc::now().date_naive(),
                method: Some(PaymentMethod::Transfer),
                note: Some("wire ref 2025/0142".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.amount_paid_cents, 50_000);

    // Withdrawal cancels the untouched season pass but keeps the paid
    // installment on the books.
    ctx.participation_service
        .set_status(
            &guardian,
            trip.id,
            participant.id,
            ParticipationStatus::NotGoing,
            None,
            Some("Family holiday clash".to_string()),
        )
        .await
        .unwrap();

    let payments = ctx
        .payment_repo
        .list_by_registration(registration.id)
        .await
        .unwrap();
    for payment in &payments {
        match payment.payment_type {
            PaymentType::Installment => assert_eq!(payment.status, PaymentStatus::Paid),
            _ => assert_eq!(payment.status, PaymentStatus::Cancelled),
        }
    }

    let registration = ctx
        .participation_service
        .get_registration(&guardian, trip.id, participant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        registration.participation_status,
        ParticipationStatus::NotGoing
    );
    assert_eq!(
        registration.participation_note.as_deref(),
        Some("Family holiday clash")
    );
}
