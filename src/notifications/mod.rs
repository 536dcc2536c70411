//! Guardian-facing mail. Dispatch is fire-and-forget: ledger mutations spawn
//! the send on a separate task and only log failures.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::MailConfig,
    error::{AppError, Result},
};

#[derive(Debug, Clone)]
pub struct PaymentConfirmedEmail {
    pub guardian_email: String,
    pub guardian_first_name: String,
    pub participant_name: String,
    pub trip_title: String,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_label: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_payment_confirmed(&self, email: PaymentConfirmedEmail) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Returns None when mail is disabled or the SMTP config is incomplete,
    /// in which case the caller falls back to the noop mailer.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from_address = config.from_address.as_deref()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = match &config.from_name {
            Some(name) => format!("{} <{}>", name, from_address),
            None => from_address.to_string(),
        };

        Some(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_payment_confirmed(&self, email: PaymentConfirmedEmail) -> Result<()> {
        let amount = format!(
            "{}.{:02} {}",
            email.amount_cents / 100,
            email.amount_cents % 100,
            email.currency
        );

        let body = format!(
            "Hello {},\n\n\
             We have received the payment \"{}\" of {} for {}'s participation \
             in {}.\n\n\
             Thank you!\n",
            email.guardian_first_name,
            email.payment_label,
            amount,
            email.participant_name,
            email.trip_title,
        );

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Notification(format!("Invalid from address: {}", e)))?,
            )
            .to(email
                .guardian_email
                .parse()
                .map_err(|e| AppError::Notification(format!("Invalid recipient: {}", e)))?)
            .subject(format!("Payment received - {}", email.trip_title))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Notification(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;

        Ok(())
    }
}

/// Used in tests and when SMTP is not configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_payment_confirmed(&self, email: PaymentConfirmedEmail) -> Result<()> {
        tracing::debug!(
            "Mail disabled, skipping payment confirmation to {} for {}",
            email.guardian_email,
            email.payment_label
        );
        Ok(())
    }
}
