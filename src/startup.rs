use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::contact_email::MessageTemplate;
use crate::email_transport::MailTransport;
use crate::routes::{contact, health_check, method_not_allowed};

/// A bound, not yet running, HTTP server.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Build the server with the relay described by `configuration`.
    pub fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let transport = configuration
            .email_transport
            .transport()
            .context("Failed to build the mail transport")?;
        Self::build_with_transport(configuration, transport)
    }

    /// Build the server around an already constructed transport.
    pub fn build_with_transport(
        configuration: Settings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        // Port 0 asks the OS for a random port, read back the actual one
        let port = listener.local_addr()?.port();

        let template = configuration.email_transport.message_template();
        let server = run(
            listener,
            transport,
            template,
            configuration.application.max_payload_bytes,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Only returns when the application is stopped
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    transport: Arc<dyn MailTransport>,
    template: MessageTemplate,
    max_payload_bytes: usize,
) -> Result<Server, std::io::Error> {
    // web::Data wraps both in an Arc, shared read-only by every worker
    let transport = web::Data::from(transport);
    let template = web::Data::new(template);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/api/contact")
                    .route(web::post().to(contact))
                    .default_service(web::route().to(method_not_allowed)),
            )
            .app_data(transport.clone())
            .app_data(template.clone())
            .app_data(web::JsonConfig::default().limit(max_payload_bytes))
    })
    .listen(listener)?
    .run();
    // No .await here
    Ok(server)
}
