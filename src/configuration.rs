use std::sync::Arc;

use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::contact_email::MessageTemplate;
use crate::email_transport::{HttpRelay, MailTransport, SmtpRelay, TransportError};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_transport: EmailTransportSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    // Environment variables are always strings for the `config` crate,
    // so the port has to be parsed from a string as well
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// Largest JSON body `/api/contact` reads before answering 413.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_payload_bytes: usize,
}

/// Which relay delivers the contact emails.
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Authenticated SMTP submission (e.g. a Gmail account with an app password).
    Smtp,
    /// Postmark-compatible HTTP mail API.
    Http,
}

/// Settings for the account the contact form relays through.
///
/// `credential_secret` is wrapped in a [`Secret`] so that it is redacted from
/// `Debug` output and only reachable through `expose_secret()`.
#[derive(serde::Deserialize, Clone)]
pub struct EmailTransportSettings {
    pub kind: TransportKind,
    /// Authenticated account: sender and recipient of every contact email.
    pub sender_account: String,
    pub credential_secret: Secret<String>,
    pub sender_label: String,
    pub smtp_host: String,
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    pub sanitize_html: bool,
}

impl EmailTransportSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn message_template(&self) -> MessageTemplate {
        MessageTemplate {
            sender_account: self.sender_account.clone(),
            sender_label: self.sender_label.clone(),
            sanitize_html: self.sanitize_html,
        }
    }

    pub fn transport(&self) -> Result<Arc<dyn MailTransport>, TransportError> {
        let transport: Arc<dyn MailTransport> = match self.kind {
            TransportKind::Smtp => Arc::new(SmtpRelay::new(
                self.smtp_host.clone(),
                self.sender_account.clone(),
                self.credential_secret.clone(),
                self.timeout(),
            )),
            TransportKind::Http => Arc::new(HttpRelay::new(
                self.base_url.clone(),
                self.credential_secret.clone(),
                self.timeout(),
            )?),
        };
        Ok(transport)
    }
}

/// The possible runtime environment for our application.
#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let mut settings = config::Config::default();
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    // Read the "default" configuration file
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;

    // Detect the running environment, default to `local` if unspecified
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    // Layer on the environment-specific values
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;

    // Add in settings from environment variables (with a prefix of APP and '__' as separator)
    // E.g. `APP_EMAIL_TRANSPORT__CREDENTIAL_SECRET=...` would set
    // `Settings.email_transport.credential_secret`
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;

    // Try to convert the configuration values it read into our "Settings" type
    settings.try_into()
}
