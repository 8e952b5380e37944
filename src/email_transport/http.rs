use std::time::Duration;

use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};

use crate::contact_email::OutboundEmail;
use crate::email_request::{ApiErrorResponse, SendEmailRequest};
use crate::email_transport::{DeliveryReceipt, MailTransport, TransportError};

const SERVER_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Client for a Postmark-compatible HTTP mail API.
pub struct HttpRelay {
    http_client: Client,
    base_url: String,
    authorization_token: Secret<String>,
}

impl HttpRelay {
    pub fn new(
        base_url: String,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            authorization_token,
        })
    }
}

#[async_trait::async_trait]
impl MailTransport for HttpRelay {
    /// `GET /server` only succeeds with a valid server token.
    #[tracing::instrument(name = "Verify HTTP mail relay", skip(self))]
    async fn verify(&self) -> Result<(), TransportError> {
        let url = format!("{}/server", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header(SERVER_TOKEN_HEADER, self.authorization_token.expose_secret())
            .send()
            .await?;
        ensure_accepted(response).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Send email over HTTP mail relay", skip(self, email))]
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let url = format!("{}/email", self.base_url);
        let request_body = SendEmailRequest::from(email);
        let response = self
            .http_client
            .post(&url)
            .header(SERVER_TOKEN_HEADER, self.authorization_token.expose_secret())
            .json(&request_body)
            .send()
            .await?;
        let receipt = ensure_accepted(response).await?.json::<DeliveryReceipt>().await?;
        Ok(receipt)
    }
}

/// Turn a non-2xx answer into [`TransportError::Rejected`], preferring the
/// API's own error message over the bare status.
async fn ensure_accepted(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(api_error) => {
            tracing::warn!(error_code = api_error.error_code, "Mail API rejected the call");
            api_error.message
        }
        Err(_) => format!("Mail API responded with {}", status),
    };
    Err(TransportError::Rejected(message))
}
