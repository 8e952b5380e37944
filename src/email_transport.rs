//! Delivery of contact emails through an external relay.
//!
//! The handler only sees [`MailTransport`]: verify the account, then send.
//! Each call opens its own session with the relay; nothing is pooled or
//! shared between requests.

mod http;
mod smtp;

pub use http::HttpRelay;
pub use smtp::SmtpRelay;

use crate::contact_email::OutboundEmail;

#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Check that the relay is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), TransportError>;

    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError>;
}

/// Whatever the relay reports back for an accepted email.
///
/// Opaque to the application: it is handed to the caller untouched.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct DeliveryReceipt(pub serde_json::Value);

impl std::fmt::Display for DeliveryReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Failures while talking to the relay. `Display` is the text surfaced to
/// the caller as `details`.
#[derive(thiserror::Error)]
pub enum TransportError {
    /// The relay refused the call (bad credentials, quota, rejected recipient).
    #[error("{0}")]
    Rejected(String),
    #[error("Invalid address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error(transparent)]
    Message(#[from] lettre::error::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::routes::error_chain_fmt(self, f)
    }
}
