#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use kolonia::{
    auth::{Actor, Role},
    domain::{
        BankAccount, CreateGuardianRequest, CreateParticipantRequest,
        CreatePaymentTemplateRequest, CreateTripRequest, Currency, Guardian, Participant,
        PaymentMethod, PaymentTemplate, PaymentType, Trip,
    },
    notifications::{Mailer, NoopMailer, PaymentConfirmedEmail},
    service::ServiceContext,
};

/// Captures every payment-confirmed mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<PaymentConfirmedEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<PaymentConfirmedEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_payment_confirmed(&self, email: PaymentConfirmedEmail) -> kolonia::error::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// One isolated in-memory database per test. A single connection keeps
/// sqlite from handing each pool checkout its own empty `:memory:` store.
pub async fn setup() -> ServiceContext {
    setup_with_mailer(Arc::new(NoopMailer)).await
}

pub async fn setup_with_mailer(mailer: Arc<dyn Mailer>) -> ServiceContext {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    ServiceContext::new(pool, mailer)
}

pub fn admin() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

pub fn guardian_actor(id: Uuid) -> Actor {
    Actor {
        id,
        role: Role::Guardian,
    }
}

pub async fn create_trip(ctx: &ServiceContext) -> Trip {
    let departure = Utc::now() + Duration::days(90);
    ctx.trip_repo
        .create(CreateTripRequest {
            title: "Winter Camp Zakopane".to_string(),
            location: "Zakopane".to_string(),
            departure_at: departure,
            return_at: departure + Duration::days(7),
            primary_stop: "Warszawa Centralna".to_string(),
            secondary_stop: Some("Krakow Glowny".to_string()),
            eligible_groups: vec!["scouts".to_string()],
            bank_accounts: vec![BankAccount {
                label: "Main".to_string(),
                account_number: "61 1090 1014 0000 0712 1981 2874".to_string(),
                currency: Currency::PLN,
            }],
        })
        .await
        .expect("create trip")
}

pub async fn create_family(ctx: &ServiceContext, birth_year: i32) -> (Guardian, Participant) {
    let tag = Uuid::new_v4().simple().to_string();
    let guardian = ctx
        .guardian_repo
        .create(CreateGuardianRequest {
            email: format!("guardian-{}@example.com", tag),
            first_name: "Anna".to_string(),
            last_name: "Kowalska".to_string(),
            phone: Some("+48 600 100 200".to_string()),
            address: Some("ul. Dluga 5, Warszawa".to_string()),
            pesel: Some("85010112345".to_string()),
        })
        .await
        .expect("create guardian");
    let participant = ctx
        .participant_repo
        .create(CreateParticipantRequest {
            guardian_id: guardian.id,
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            birth_date: NaiveDate::from_ymd_opt(birth_year, 6, 15).unwrap(),
            group_name: Some("scouts".to_string()),
        })
        .await
        .expect("create participant");
    (guardian, participant)
}

pub async fn installment_template(
    ctx: &ServiceContext,
    trip_id: Uuid,
    number: i32,
    amount_cents: i64,
    due_date: Option<NaiveDate>,
) -> PaymentTemplate {
    ctx.payment_template_repo
        .create(
            trip_id,
            CreatePaymentTemplateRequest {
                payment_type: PaymentType::Installment,
                installment_number: Some(number),
                is_first_installment: number == 1,
                includes_season_pass: false,
                category_name: None,
                birth_year_from: None,
                birth_year_to: None,
                amount_cents,
                currency: Currency::PLN,
                due_date,
                payment_method: Some(PaymentMethod::Transfer),
            },
        )
        .await
        .expect("create installment template")
}

pub async fn season_pass_template(
    ctx: &ServiceContext,
    trip_id: Uuid,
    amount_cents: i64,
    birth_year_from: Option<i32>,
    birth_year_to: Option<i32>,
) -> PaymentTemplate {
    ctx.payment_template_repo
        .create(
            trip_id,
            CreatePaymentTemplateRequest {
                payment_type: PaymentType::SeasonPass,
                installment_number: None,
                is_first_installment: false,
                includes_season_pass: false,
                category_name: None,
                birth_year_from,
                birth_year_to,
                amount_cents,
                currency: Currency::PLN,
                due_date: None,
                payment_method: None,
            },
        )
        .await
        .expect("create season pass template")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
