use std::time::Duration;

use anyhow::Context;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{Address, Message, Transport};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::contact_email::OutboundEmail;
use crate::email_transport::{DeliveryReceipt, MailTransport, TransportError};
use crate::telemetry::spawn_blocking_with_tracing;

/// Authenticated SMTP submission over implicit TLS.
///
/// lettre's `SmtpTransport` is blocking, so every call is moved to the
/// blocking pool through [`spawn_blocking_with_tracing`].
#[derive(Clone)]
pub struct SmtpRelay {
    host: String,
    account: String,
    credential: Secret<String>,
    timeout: Duration,
}

impl SmtpRelay {
    pub fn new(
        host: String,
        account: String,
        credential: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host,
            account,
            credential,
            timeout,
        }
    }

    fn connect(&self) -> Result<lettre::SmtpTransport, TransportError> {
        let credentials = Credentials::new(
            self.account.clone(),
            self.credential.expose_secret().to_owned(),
        );
        Ok(lettre::SmtpTransport::relay(&self.host)?
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build())
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpRelay {
    #[tracing::instrument(name = "Verify SMTP relay", skip(self), fields(host = %self.host))]
    async fn verify(&self) -> Result<(), TransportError> {
        let relay = self.clone();
        let connected = spawn_blocking_with_tracing(move || {
            relay
                .connect()?
                .test_connection()
                .map_err(TransportError::from)
        })
        .await
        .context("Failed to spawn the SMTP verification task")??;

        if connected {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!(
                "SMTP server {} did not answer the connection test",
                self.host
            )))
        }
    }

    #[tracing::instrument(
        name = "Send email over SMTP",
        skip(self, email),
        fields(host = %self.host)
    )]
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let message_id = message_id(&email.sender_account);
        let message = build_message(email, &message_id)?;
        let relay = self.clone();

        let (message, response) = spawn_blocking_with_tracing(move || {
            let response = relay.connect()?.send(&message)?;
            Ok::<_, TransportError>((message, response))
        })
        .await
        .context("Failed to spawn the SMTP delivery task")??;

        Ok(receipt(&message, &message_id, &response))
    }
}

fn parse_address(address: &str) -> Result<Address, TransportError> {
    address
        .parse::<Address>()
        .map_err(|source| TransportError::InvalidAddress {
            address: address.to_owned(),
            source,
        })
}

fn message_id(sender_account: &str) -> String {
    let domain = sender_account
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4(), domain)
}

fn build_message(email: &OutboundEmail, message_id: &str) -> Result<Message, TransportError> {
    let from = Mailbox::new(
        Some(email.sender_label.clone()),
        parse_address(&email.sender_account)?,
    );
    let mut builder = Message::builder()
        .from(from)
        .to(Mailbox::new(None, parse_address(&email.recipient)?))
        .subject(email.subject.clone())
        .message_id(Some(message_id.to_owned()));

    // The visitor's address is relayed as typed; the body still carries it
    match email.reply_to.parse::<Address>() {
        Ok(address) => builder = builder.reply_to(Mailbox::new(None, address)),
        Err(e) => tracing::warn!(
            reply_to = %email.reply_to,
            error.message = %e,
            "Reply-To is not a usable address, sending without it"
        ),
    }

    let message = builder.multipart(MultiPart::alternative_plain_html(
        email.text_body.clone(),
        email.html_body.clone(),
    ))?;
    Ok(message)
}

/// Receipt shaped like the ones SMTP libraries commonly report.
fn receipt(message: &Message, message_id: &str, response: &Response) -> DeliveryReceipt {
    let envelope = message.envelope();
    let recipients: Vec<String> = envelope.to().iter().map(ToString::to_string).collect();
    let reply = response.message().collect::<Vec<_>>().join(" ");

    DeliveryReceipt(serde_json::json!({
        "messageId": message_id,
        "envelope": {
            "from": envelope.from().map(ToString::to_string),
            "to": recipients,
        },
        "accepted": recipients,
        "rejected": [],
        "response": format!("{} {}", response.code(), reply),
    }))
}
