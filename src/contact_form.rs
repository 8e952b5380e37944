//! Client side of the contact endpoint.
//!
//! [`ContactForm`] models what a visitor interacts with: three fields, a
//! submit action that is disabled while a request is in flight, and a
//! transient notification reporting the outcome.

mod notification;

pub use notification::{Notification, NotificationKind, Notifier, DEFAULT_DISMISS_AFTER};

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use reqwest::Client;

use crate::domain::is_present;

pub const INCOMPLETE_FORM_MESSAGE: &str = "Please fill all fields before sending.";
pub const SENT_MESSAGE: &str = "Message sent successfully!";
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to send message.";
pub const NETWORK_FAILURE_MESSAGE: &str = "Internal server error. Try again later.";

#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl FormFields {
    pub fn is_complete(&self) -> bool {
        is_present(&self.name) && is_present(&self.email) && is_present(&self.message)
    }
}

/// How a call to [`ContactForm::submit`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    /// A field was blank; nothing was sent.
    Incomplete,
    /// The endpoint answered with a failure status.
    Rejected(String),
    /// The request never completed.
    NetworkFailure,
    /// Another submission is still in flight.
    AlreadySending,
}

pub struct ContactForm {
    http_client: Client,
    endpoint: String,
    fields: Mutex<FormFields>,
    sending: AtomicBool,
    notifier: Notifier,
}

impl ContactForm {
    /// `endpoint` is the full URL of the contact handler, e.g.
    /// `https://example.com/api/contact`.
    pub fn new(endpoint: String) -> Self {
        Self::with_notifier(endpoint, Notifier::default())
    }

    pub fn with_notifier(endpoint: String, notifier: Notifier) -> Self {
        Self {
            http_client: Client::new(),
            endpoint,
            fields: Mutex::new(FormFields::default()),
            sending: AtomicBool::new(false),
            notifier,
        }
    }

    pub fn set_fields(&self, fields: FormFields) {
        *self.fields.lock() = fields;
    }

    pub fn fields(&self) -> FormFields {
        self.fields.lock().clone()
    }

    /// While sending, inputs and the submit control are disabled.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    /// Validate the current fields and post them to the endpoint.
    ///
    /// Every outcome ends in a notification; none of them is an `Err`.
    #[tracing::instrument(
        name = "Submit contact form",
        skip(self),
        fields(endpoint = %self.endpoint)
    )]
    pub async fn submit(&self) -> SubmitOutcome {
        let fields = self.fields();
        if !fields.is_complete() {
            self.notifier.show(NotificationKind::Error, INCOMPLETE_FORM_MESSAGE);
            return SubmitOutcome::Incomplete;
        }

        let _sending = match SendingGuard::acquire(&self.sending) {
            Some(guard) => guard,
            None => return SubmitOutcome::AlreadySending,
        };

        let response = match self
            .http_client
            .post(&self.endpoint)
            .json(&fields)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "Contact submit error");
                self.notifier.show(NotificationKind::Error, NETWORK_FAILURE_MESSAGE);
                return SubmitOutcome::NetworkFailure;
            }
        };

        let status = response.status();
        // A body that is not JSON is read as an empty object
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or_else(|_| serde_json::json!({}));

        if status.is_success() {
            self.notifier.show(NotificationKind::Success, SENT_MESSAGE);
            self.set_fields(FormFields::default());
            SubmitOutcome::Sent
        } else {
            let message = failure_message(&body);
            self.notifier.show(NotificationKind::Error, message.clone());
            SubmitOutcome::Rejected(message)
        }
    }
}

/// Pick the text to show for a failed submission: `error`, then `details`,
/// then a generic message. Empty strings are skipped.
pub fn failure_message(body: &serde_json::Value) -> String {
    ["error", "details"]
        .iter()
        .filter_map(|key| body.get(key).and_then(serde_json::Value::as_str))
        .find(|message| !message.is_empty())
        .unwrap_or(FALLBACK_FAILURE_MESSAGE)
        .to_owned()
}

/// Holds the `sending` flag for the duration of one submission and clears it
/// when dropped, whichever way `submit` returns.
#[derive(Debug)]
struct SendingGuard<'a>(&'a AtomicBool);

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
