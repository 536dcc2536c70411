//! Pure token substitution for contract bodies. No persistence, no clock:
//! everything rendered comes in through `RenderContext`.

use crate::domain::{PaymentTemplate, Trip};

/// Shown in the number slot of previews; a real number is only allocated on
/// issue.
pub const PREVIEW_CONTRACT_NUMBER: &str = "(assigned on issue)";

/// Values substituted into a contract template body. Built either from a real
/// registration (issuance) or from placeholder text (template preview).
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub trip_title: String,
    pub trip_location: String,
    pub departure_date: String,
    pub return_date: String,
    pub guardian_name: String,
    pub guardian_address: String,
    pub guardian_pesel: String,
    pub guardian_phone: String,
    pub child_name: String,
    pub child_birth_date: String,
    pub bank_accounts: String,
    pub payment_schedule: String,
    pub contract_number: String,
    pub issue_date: String,
}

impl RenderContext {
    /// Placeholder values used when previewing a template on a trip with no
    /// active registrations yet.
    pub fn placeholder(trip: &Trip, payment_schedule: String) -> Self {
        Self {
            trip_title: trip.title.clone(),
            trip_location: trip.location.clone(),
            departure_date: trip.departure_at.format("%Y-%m-%d").to_string(),
            return_date: trip.return_at.format("%Y-%m-%d").to_string(),
            guardian_name: "{{guardian_name}}".to_string(),
            guardian_address: "{{guardian_address}}".to_string(),
            guardian_pesel: "{{guardian_pesel}}".to_string(),
            guardian_phone: "{{guardian_phone}}".to_string(),
            child_name: "{{child_name}}".to_string(),
            child_birth_date: "{{child_birth_date}}".to_string(),
            bank_accounts: format_bank_accounts(trip),
            payment_schedule,
            contract_number: PREVIEW_CONTRACT_NUMBER.to_string(),
            issue_date: "{{issue_date}}".to_string(),
        }
    }
}

pub fn render(template_body: &str, ctx: &RenderContext) -> String {
    let pairs: [(&str, &str); 14] = [
        ("{{trip_title}}", &ctx.trip_title),
        ("{{trip_location}}", &ctx.trip_location),
        ("{{departure_date}}", &ctx.departure_date),
        ("{{return_date}}", &ctx.return_date),
        ("{{guardian_name}}", &ctx.guardian_name),
        ("{{guardian_address}}", &ctx.guardian_address),
        ("{{guardian_pesel}}", &ctx.guardian_pesel),
        ("{{guardian_phone}}", &ctx.guardian_phone),
        ("{{child_name}}", &ctx.child_name),
        ("{{child_birth_date}}", &ctx.child_birth_date),
        ("{{bank_accounts}}", &ctx.bank_accounts),
        ("{{payment_schedule}}", &ctx.payment_schedule),
        ("{{contract_number}}", &ctx.contract_number),
        ("{{issue_date}}", &ctx.issue_date),
    ];

    let mut out = template_body.to_string();
    for (token, value) in pairs {
        out = out.replace(token, value);
    }
    out
}

pub fn format_amount_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// One line per planned charge: label, right-aligned amount with currency,
/// due date or "by agreement".
pub fn format_payment_schedule(templates: &[PaymentTemplate]) -> String {
    templates
        .iter()
        .map(|tpl| {
            let amount = format!("{} {}", format_amount_cents(tpl.amount_cents), tpl.currency);
            let due = match tpl.due_date {
                Some(date) => format!("due {}", date.format("%Y-%m-%d")),
                None => "by agreement".to_string(),
            };
            format!("{:<32}{:>14}  {}", tpl.label(), amount, due)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_bank_accounts(trip: &Trip) -> String {
    trip.bank_accounts
        .iter()
        .map(|acc| format!("{} ({}): {}", acc.label, acc.currency, acc.account_number))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, PaymentType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn template(
        label: Option<&str>,
        payment_type: PaymentType,
        installment: Option<i32>,
        amount_cents: i64,
        due: Option<NaiveDate>,
    ) -> PaymentTemplate {
        PaymentTemplate {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            payment_type,
            installment_number: installment,
            is_first_installment: installment == Some(1),
            includes_season_pass: false,
            category_name: label.map(String::from),
            birth_year_from: None,
            birth_year_to: None,
            amount_cents,
            currency: Currency::PLN,
            due_date: due,
            payment_method: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn substitutes_all_tokens() {
        let ctx = RenderContext {
            trip_title: "Summer Camp 2026".to_string(),
            trip_location: "Zakopane".to_string(),
            departure_date: "2026-07-01".to_string(),
            return_date: "2026-07-14".to_string(),
            guardian_name: "Anna Kowalska".to_string(),
            guardian_address: "ul. Polna 1, Warszawa".to_string(),
            guardian_pesel: "90010112345".to_string(),
            guardian_phone: "+48 600 000 000".to_string(),
            child_name: "Jan Kowalski".to_string(),
            child_birth_date: "2015-05-20".to_string(),
            bank_accounts: "Main (PLN): 00 1111 2222".to_string(),
            payment_schedule: "Installment 1   500.00 PLN  due 2026-03-01".to_string(),
            contract_number: "7/2026".to_string(),
            issue_date: "2026-01-15".to_string(),
        };

        let body = "Contract {{contract_number}}: {{child_name}} joins \
                    {{trip_title}} in {{trip_location}}.\n{{payment_schedule}}";
        let rendered = render(body, &ctx);

        assert!(rendered.contains("Contract 7/2026"));
        assert!(rendered.contains("Jan Kowalski joins Summer Camp 2026 in Zakopane"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let ctx = RenderContext::placeholder(
            &crate::domain::Trip {
                id: Uuid::new_v4(),
                title: "Winter Camp".to_string(),
                location: "Szczyrk".to_string(),
                status: crate::domain::TripStatus::Published,
                departure_at: Utc::now(),
                return_at: Utc::now(),
                primary_stop: "Warszawa Centralna".to_string(),
                secondary_stop: None,
                eligible_groups: vec![],
                bank_accounts: vec![],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            String::new(),
        );
        assert_eq!(render("{{no_such_token}}", &ctx), "{{no_such_token}}");
    }

    #[test]
    fn schedule_lines_carry_amount_and_due_date() {
        let templates = vec![
            template(None, PaymentType::Installment, Some(1), 50_000, NaiveDate::from_ymd_opt(2025, 3, 1)),
            template(Some("Season pass SKI"), PaymentType::SeasonPass, None, 30_000, None),
        ];
        let schedule = format_payment_schedule(&templates);
        let lines: Vec<&str> = schedule.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Installment 1"));
        assert!(lines[0].contains("500.00 PLN"));
        assert!(lines[0].ends_with("due 2025-03-01"));
        assert!(lines[1].starts_with("Season pass SKI"));
        assert!(lines[1].ends_with("by agreement"));
    }

    #[test]
    fn amounts_format_with_two_decimals() {
        assert_eq!(format_amount_cents(50_000), "500.00");
        assert_eq!(format_amount_cents(1), "0.01");
        assert_eq!(format_amount_cents(123_45), "123.45");
    }
}
