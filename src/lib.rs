pub mod configuration;
pub mod contact_email;
pub mod contact_form;
pub mod domain;
pub mod email_request;
pub mod email_transport;
pub mod routes;
pub mod startup;
pub mod telemetry;
