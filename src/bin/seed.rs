use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use kolonia::{
    auth::{Actor, Role},
    domain::{
        BankAccount, CreateGuardianRequest, CreateParticipantRequest,
        CreatePaymentTemplateRequest, CreateTripRequest, Currency, ParticipationStatus,
        PaymentMethod, PaymentType, UpsertContractTemplateRequest,
    },
    notifications::NoopMailer,
    service::ServiceContext,
};

#[derive(Parser)]
#[command(about = "Seed the kolonia database with development data")]
struct Args {
    /// Number of guardians (each gets two participants)
    #[arg(long, default_value_t = 5)]
    guardians: usize,

    /// Confirm participation for the first participant of each guardian
    #[arg(long, default_value_t = true)]
    confirm: bool,
}

const CONTRACT_TEMPLATE: &str = "\
AGREEMENT No {{contract_number}}, issued {{issue_date}}

Trip: {{trip_title}}, {{trip_location}}
From {{departure_date}} to {{return_date}}

Guardian: {{guardian_name}}, {{guardian_address}}
PESEL: {{guardian_pesel}}, phone: {{guardian_phone}}
Participant: {{child_name}}, born {{child_birth_date}}

Payment schedule:
{{payment_schedule}}

Bank accounts:
{{bank_accounts}}
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Starting database seeding...");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:kolonia.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let ctx = ServiceContext::new(db_pool, Arc::new(NoopMailer));
    let admin = Actor {
        id: Uuid::new_v4(),
        role: Role::Admin,
    };

    println!("Creating trip...");
    let departure = Utc::now() + Duration::days(60);
    let trip = ctx
        .trip_repo
        .create(CreateTripRequest {
            title: "Summer Camp Mazury 2026".to_string(),
            location: "Gizycko".to_string(),
            departure_at: departure,
            return_at: departure + Duration::days(13),
            primary_stop: "Warszawa Zachodnia".to_string(),
            secondary_stop: Some("Lodz Fabryczna".to_string()),
            eligible_groups: vec!["scouts".to_string(), "cubs".to_string()],
            bank_accounts: vec![BankAccount {
                label: "Main".to_string(),
                account_number: "12 1020 0000 0000 0000 0000 0001".to_string(),
                currency: Currency::PLN,
            }],
        })
        .await?;

    println!("Creating payment templates...");
    for (number, amount, due) in [
        (1, 50_000, Some("2026-03-01")),
        (2, 70_000, Some("2026-05-15")),
    ] {
        ctx.payment_template_repo
            .create(
                trip.id,
                CreatePaymentTemplateRequest {
                    payment_type: PaymentType::Installment,
                    installment_number: Some(number),
                    is_first_installment: number == 1,
                    includes_season_pass: false,
                    category_name: None,
                    birth_year_from: None,
                    birth_year_to: None,
                    amount_cents: amount,
                    currency: Currency::PLN,
                    due_date: due.map(|d| d.parse::<NaiveDate>().unwrap()),
                    payment_method: Some(PaymentMethod::Transfer),
                },
            )
            .await?;
    }
    ctx.payment_template_repo
        .create(
            trip.id,
            CreatePaymentTemplateRequest {
                payment_type: PaymentType::SeasonPass,
                installment_number: None,
                is_first_installment: false,
                includes_season_pass: false,
                category_name: Some("Season pass 2026".to_string()),
                birth_year_from: Some(2012),
                birth_year_to: Some(2016),
                amount_cents: 30_000,
                currency: Currency::PLN,
                due_date: None,
                payment_method: None,
            },
        )
        .await?;

    println!("Creating contract template...");
    ctx.contract_template_repo
        .upsert(
            trip.id,
            UpsertContractTemplateRequest {
                body: CONTRACT_TEMPLATE.to_string(),
                is_active: true,
            },
        )
        .await?;

    println!("Creating {} guardians with participants...", args.guardians);
    for i in 0..args.guardians {
        let last_name: String = LastName().fake();
        let guardian = ctx
            .guardian_repo
            .create(CreateGuardianRequest {
                email: SafeEmail().fake(),
                first_name: FirstName().fake(),
                last_name: last_name.clone(),
                phone: Some(PhoneNumber().fake()),
                address: Some(format!("ul. Polna {}, Warszawa", i + 1)),
                pesel: Some(format!("900101{:05}", i)),
            })
            .await?;

        let mut first = None;
        for j in 0..2 {
            let birth_year = 2011 + ((i + j) % 6) as i32;
            let participant = ctx
                .participant_repo
                .create(CreateParticipantRequest {
                    guardian_id: guardian.id,
                    first_name: FirstName().fake(),
                    last_name: last_name.clone(),
                    birth_date: NaiveDate::from_ymd_opt(birth_year, 6, 15).unwrap(),
                    group_name: Some("scouts".to_string()),
                })
                .await?;
            if first.is_none() {
                first = Some(participant);
            }
        }

        if args.confirm {
            let participant = first.unwrap();
            ctx.participation_service
                .set_status(
                    &admin,
                    trip.id,
                    participant.id,
                    ParticipationStatus::Confirmed,
                    None,
                    None,
                )
                .await?;
        }
    }

    println!("Seeding complete.");
    Ok(())
}
