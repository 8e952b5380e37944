use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use secrecy::Secret;
use wiremock::MockServer;

use portfolio_contact::configuration::{get_configuration, Settings, TransportKind};
use portfolio_contact::contact_email::OutboundEmail;
use portfolio_contact::email_transport::{DeliveryReceipt, MailTransport, TransportError};
use portfolio_contact::startup::Application;
use portfolio_contact::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialized once rather than for each test case
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_lvl = "info".to_string();
    let subscriber_name = "test".to_string();

    // The sink is part of the type returned by `get_subscriber`, so both
    // branches have to initialize on their own
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const OWNER_ACCOUNT: &str = "owner@example.com";

/// In-process stand-in for the mail relay: records every call and fails on
/// demand.
#[derive(Default)]
pub struct RecordingTransport {
    verify_calls: Mutex<usize>,
    sent: Mutex<Vec<OutboundEmail>>,
    verify_failure: Option<String>,
    send_failure: Option<String>,
}

impl RecordingTransport {
    pub fn failing_verification(message: &str) -> Self {
        Self {
            verify_failure: Some(message.to_owned()),
            ..Self::default()
        }
    }

    pub fn failing_send(message: &str) -> Self {
        Self {
            send_failure: Some(message.to_owned()),
            ..Self::default()
        }
    }

    pub fn verify_calls(&self) -> usize {
        *self.verify_calls.lock()
    }

    pub fn send_calls(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().clone()
    }

    pub fn receipt_for(sequence: usize) -> DeliveryReceipt {
        DeliveryReceipt(serde_json::json!({
            "messageId": format!("<{}@example.com>", sequence),
            "envelope": { "from": OWNER_ACCOUNT, "to": [OWNER_ACCOUNT] },
            "accepted": [OWNER_ACCOUNT],
            "rejected": [],
            "response": "250 2.0.0 OK",
        }))
    }
}

#[async_trait::async_trait]
impl MailTransport for RecordingTransport {
    async fn verify(&self) -> Result<(), TransportError> {
        *self.verify_calls.lock() += 1;
        match &self.verify_failure {
            Some(message) => Err(TransportError::Rejected(message.clone())),
            None => Ok(()),
        }
    }

    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let mut sent = self.sent.lock();
        sent.push(email.clone());
        match &self.send_failure {
            Some(message) => Err(TransportError::Rejected(message.clone())),
            None => Ok(Self::receipt_for(sent.len())),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub transport: Arc<RecordingTransport>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub fn contact_url(&self) -> String {
        format!("{}/api/contact", self.address)
    }

    pub async fn post_contact(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&self.contact_url())
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Randomized configuration: port 0 so every test gets its own server
fn test_configuration() -> Settings {
    let mut c = get_configuration().expect("Failed to read configuration.");
    c.application.port = 0;
    c.email_transport.sender_account = OWNER_ACCOUNT.to_string();
    c
}

async fn launch(configuration: Settings, transport: Arc<dyn MailTransport>) -> String {
    Lazy::force(&TRACING);

    let application = Application::build_with_transport(configuration, transport)
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    format!("http://127.0.0.1:{}", port)
}

/// Spin up the application in the background, backed by `transport`
pub async fn spawn_app_with(transport: RecordingTransport) -> TestApp {
    spawn_configured_app(test_configuration(), transport).await
}

/// Same as [`spawn_app`], but refusing JSON bodies over `max_payload_bytes`
pub async fn spawn_app_with_payload_limit(max_payload_bytes: usize) -> TestApp {
    let mut configuration = test_configuration();
    configuration.application.max_payload_bytes = max_payload_bytes;
    spawn_configured_app(configuration, RecordingTransport::default()).await
}

async fn spawn_configured_app(configuration: Settings, transport: RecordingTransport) -> TestApp {
    let transport = Arc::new(transport);
    let address = launch(configuration, transport.clone()).await;

    TestApp {
        address,
        transport,
        api_client: reqwest::Client::new(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(RecordingTransport::default()).await
}

/// The application wired to the real HTTP relay, pointed at a mock mail API
pub struct RelayTestApp {
    pub address: String,
    pub email_server: MockServer,
}

pub async fn spawn_app_with_http_relay() -> RelayTestApp {
    let email_server = MockServer::start().await;

    let mut configuration = test_configuration();
    configuration.email_transport.kind = TransportKind::Http;
    configuration.email_transport.base_url = email_server.uri();
    configuration.email_transport.credential_secret = Secret::new("server-token".to_string());

    let transport = configuration
        .email_transport
        .transport()
        .expect("Failed to build the HTTP relay.");
    let address = launch(configuration, transport).await;

    RelayTestApp {
        address,
        email_server,
    }
}
