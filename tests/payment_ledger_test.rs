mod common;

use chrono::{Duration, Utc};
use kolonia::{
    auth::Actor,
    domain::{Currency, ParticipationStatus, Payment, PaymentMethod, PaymentStatus},
    error::AppError,
    service::payment_ledger::RecordTransactionRequest,
};

use common::*;

/// Confirms one participant against a single 500.00 PLN installment and
/// returns the generated payment.
async fn confirmed_payment(
    ctx: &kolonia::service::ServiceContext,
    admin: &Actor,
    due_in_days: i64,
) -> Payment {
    let trip = create_trip(ctx).await;
    let due = (Utc::now() + Duration::days(due_in_days)).date_naive();
    installment_template(ctx, trip.id, 1, 50_000, Some(due)).await;
    let (_, participant) = create_family(ctx, 2014).await;
    let registration = ctx
        .participation_service
        .set_status(
            admin,
            trip.id,
            participant.id,
            ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();
    ctx.payment_repo
        .list_by_registration(registration.id)
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
}

fn receipt(amount_cents: i64) -> RecordTransactionRequest {
    RecordTransactionRequest {
        amount_cents,
        currency: Currency::PLN,
        paid_on: Utc::now().date_naive(),
        method: Some(PaymentMethod::Transfer),
        note: None,
    }
}

#[tokio::test]
async fn partial_then_full_receipt_derives_status() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    let updated = ctx
        .payment_ledger
        .record_transaction(&admin, payment.id, receipt(30_000))
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::PartiallyPaid);
    assert_eq!(updated.amount_paid_cents, 30_000);
    assert!(updated.paid_at.is_none());

    let updated = ctx
        .payment_ledger
        .record_transaction(&admin, payment.id, receipt(20_000))
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::Paid);
    assert_eq!(updated.amount_paid_cents, 50_000);
    assert!(updated.paid_at.is_some());
}

#[tokio::test]
async fn partial_receipt_past_due_is_partially_paid_overdue() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, -10).await;

    let updated = ctx
        .payment_ledger
        .record_transaction(&admin, payment.id, receipt(20_000))
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::PartiallyPaidOverdue);
}

#[tokio::test]
async fn non_positive_receipts_are_rejected() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    for amount in [0, -100] {
        let err = ctx
            .payment_ledger
            .record_transaction(&admin, payment.id, receipt(amount))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn mismatched_currency_is_accepted() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    let updated = ctx
        .payment_ledger
        .record_transaction(
            &admin,
            payment.id,
            RecordTransactionRequest {
                amount_cents: 50_000,
                currency: Currency::EUR,
                paid_on: Utc::now().date_naive(),
                method: None,
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn mark_fully_paid_synthesizes_the_remainder() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    ctx.payment_ledger
        .record_transaction(&admin, payment.id, receipt(10_000))
        .await
        .unwrap();
    let updated = ctx
        .payment_ledger
        .mark_fully_paid(&admin, payment.id, Some(PaymentMethod::Cash))
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::Paid);
    assert_eq!(updated.amount_paid_cents, 50_000);

    let transactions = ctx
        .payment_ledger
        .list_transactions(payment.id)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 2);
    let settlement = transactions
        .iter()
        .find(|t| t.note.as_deref().map_or(false, |n| n.contains("settled")))
        .expect("synthesized settlement transaction");
    assert_eq!(settlement.amount_cents, 40_000);
}

#[tokio::test]
async fn status_override_writes_a_reconciling_transaction() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    ctx.payment_ledger
        .record_transaction(&admin, payment.id, receipt(50_000))
        .await
        .unwrap();
    let updated = ctx
        .payment_ledger
        .set_status(&admin, payment.id, PaymentStatus::Pending)
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::Pending);
    assert_eq!(updated.amount_paid_cents, 0);
    assert!(updated.paid_at.is_none());

    // History still sums to the ledger total.
    let transactions = ctx
        .payment_ledger
        .list_transactions(payment.id)
        .await
        .unwrap();
    let total: i64 = transactions.iter().map(|t| t.amount_cents).sum();
    assert_eq!(total, 0);
    assert_eq!(transactions.len(), 2);
}

#[tokio::test]
async fn partial_states_cannot_be_set_directly() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    for status in [
        PaymentStatus::PartiallyPaid,
        PaymentStatus::Overdue,
        PaymentStatus::PartiallyPaidOverdue,
    ] {
        let err = ctx
            .payment_ledger
            .set_status(&admin, payment.id, status)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

#[tokio::test]
async fn discount_always_recomputes_from_the_original_amount() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;
    assert_eq!(payment.amount_cents, 50_000);

    let discounted = ctx
        .payment_ledger
        .apply_discount(payment.id, 20.0)
        .await
        .unwrap();
    assert_eq!(discounted.amount_cents, 40_000);
    assert_eq!(discounted.original_amount_cents, 50_000);

    // Removing the discount restores the baseline exactly.
    let restored = ctx
        .payment_ledger
        .apply_discount(payment.id, 0.0)
        .await
        .unwrap();
    assert_eq!(restored.amount_cents, 50_000);

    let err = ctx
        .payment_ledger
        .apply_discount(payment.id, 120.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn manual_amount_update_keeps_the_discount_percentage() {
    let ctx = setup().await;
    let admin = admin();
    let payment = confirmed_payment(&ctx, &admin, 60).await;

    ctx.payment_ledger
        .apply_discount(payment.id, 10.0)
        .await
        .unwrap();
    let updated = ctx
        .payment_ledger
        .update_amount(payment.id, 42_000)
        .await
        .unwrap();
    assert_eq!(updated.amount_cents, 42_000);
    assert_eq!(updated.discount_percentage, 10.0);
    assert_eq!(updated.original_amount_cents, 50_000);
}

#[tokio::test]
async fn payments_regenerate_after_cancellation() {
    let ctx = setup().await;
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
            ParticipationStatus::Confirmed,
            None,
            None,
        )
        .await
        .unwrap();
    ctx.participation_service
        .set_status(
            &admin,
            trip.id,
            participant.id,
            ParticipationStatus::NotGoing,
            None,
            None,
        )
        .await
        .unwrap();
    ctx.participation_service
        .set_status(
            &admin,
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
    let cancelled = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Cancelled)
        .count();
    let pending = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Pending)
        .count();
    assert_eq!(cancelled, 1);
    assert_eq!(pending, 1);
}
