use std::fmt::{Debug, Formatter};

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::contact_email::MessageTemplate;
use crate::domain::{ContactSubmission, SubmissionError};
use crate::email_transport::{DeliveryReceipt, MailTransport, TransportError};
use crate::routes::error_chain_fmt;

/// Raw JSON body of a contact submission. Every field is optional here;
/// presence is decided by [`ContactSubmission`].
#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
pub struct FormData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(serde::Serialize)]
struct DeliveredBody<'a> {
    success: bool,
    info: &'a DeliveryReceipt,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large")]
    PayloadTooLarge(#[source] actix_web::Error),
    #[error(transparent)]
    ValidationError(#[from] SubmissionError),
    #[error("Email could not be sent")]
    DeliveryError(#[source] TransportError),
}

impl Debug for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ContactError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ContactError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ContactError::DeliveryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // The transport's own message is handed back to the caller as `details`
        let details = match self {
            ContactError::DeliveryError(e) => Some(e.to_string()),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            details,
        })
    }
}

/// Any verb other than POST on the contact resource.
pub async fn method_not_allowed(request: HttpRequest) -> Result<HttpResponse, ContactError> {
    tracing::info!(method = %request.method(), "Non-POST request to /api/contact");
    Err(ContactError::MethodNotAllowed)
}

#[tracing::instrument(
    name = "Relay a contact submission",
    skip(body, transport, template),
    fields(
        submitter_name = tracing::field::Empty,
        submitter_email = tracing::field::Empty
    )
)]
pub async fn contact(
    body: Result<web::Json<FormData>, actix_web::Error>,
    transport: web::Data<dyn MailTransport>,
    template: web::Data<MessageTemplate>,
) -> Result<HttpResponse, ContactError> {
    let form = read_form(body)?;
    tracing::info!(
        name = ?form.name,
        email = ?form.email,
        message = ?form.message,
        "Contact request body"
    );

    let submission = ContactSubmission::try_from(form).map_err(|e| {
        tracing::info!(missing = ?e.missing, "Validation failed: missing fields");
        e
    })?;
    tracing::Span::current()
        .record("submitter_name", &tracing::field::display(&submission.name))
        .record("submitter_email", &tracing::field::display(&submission.email));

    let receipt = deliver(transport.get_ref(), &template, &submission)
        .await
        .map_err(|e| {
            tracing::error!(error.cause_chain = ?e, "Email send error");
            ContactError::DeliveryError(e)
        })?;
    tracing::info!(receipt = %receipt, "Email sent");

    Ok(HttpResponse::Ok().json(DeliveredBody {
        success: true,
        info: &receipt,
    }))
}

/// A missing or unreadable body counts as an empty submission. Only a body
/// over the configured limit is refused outright.
fn read_form(
    body: Result<web::Json<FormData>, actix_web::Error>,
) -> Result<FormData, ContactError> {
    let e = match body {
        Ok(json) => return Ok(json.into_inner()),
        Err(e) => e,
    };
    let too_large = matches!(
        e.as_error::<JsonPayloadError>(),
        Some(JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. })
    );
    if too_large {
        tracing::info!(error.message = %e, "Contact request body over the limit");
        Err(ContactError::PayloadTooLarge(e))
    } else {
        tracing::info!(error.message = %e, "Unreadable contact request body");
        Ok(FormData::default())
    }
}

/// Verify the relay, then send exactly once. No retries.
#[tracing::instrument(name = "Deliver contact email", skip(transport, template, submission))]
async fn deliver(
    transport: &dyn MailTransport,
    template: &MessageTemplate,
    submission: &ContactSubmission,
) -> Result<DeliveryReceipt, TransportError> {
    transport.verify().await?;
    tracing::info!("Mail transport verified");

    let email = template.render(submission);
    transport.send(&email).await
}
