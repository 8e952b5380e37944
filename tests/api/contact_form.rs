use std::net::TcpListener;

use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use portfolio_contact::contact_form::{
    ContactForm, FormFields, Notification, NotificationKind, SubmitOutcome,
    FALLBACK_FAILURE_MESSAGE, INCOMPLETE_FORM_MESSAGE, NETWORK_FAILURE_MESSAGE, SENT_MESSAGE,
};

use crate::helpers::{spawn_app, spawn_app_with, RecordingTransport};

fn filled_in() -> FormFields {
    FormFields {
        name: "Ava".into(),
        email: "ava@x.com".into(),
        message: "Hi".into(),
    }
}

fn notification(kind: NotificationKind, message: &str) -> Option<Notification> {
    Some(Notification {
        kind,
        message: message.into(),
    })
}

#[tokio::test]
async fn test_incomplete_form_is_never_sent() {
    let app = spawn_app().await;
    let form = ContactForm::new(app.contact_url());
    form.set_fields(FormFields {
        message: "".into(),
        ..filled_in()
    });

    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Incomplete);
    assert_eq!(
        form.notification(),
        notification(NotificationKind::Error, INCOMPLETE_FORM_MESSAGE)
    );
    assert_eq!(app.transport.verify_calls(), 0);
    assert_eq!(app.transport.send_calls(), 0);
    assert!(!form.is_sending());
}

#[tokio::test]
async fn test_successful_submission_resets_the_form() {
    let app = spawn_app().await;
    let form = ContactForm::new(app.contact_url());
    form.set_fields(filled_in());

    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Sent);
    assert_eq!(form.notification(), notification(NotificationKind::Success, SENT_MESSAGE));
    assert_eq!(form.fields(), FormFields::default());
    assert!(!form.is_sending());
    assert_eq!(app.transport.send_calls(), 1);
}

#[tokio::test]
async fn test_failed_delivery_shows_the_server_error() {
    let app = spawn_app_with(RecordingTransport::failing_verification("invalid credentials")).await;
    let form = ContactForm::new(app.contact_url());
    form.set_fields(filled_in());

    let outcome = form.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected("Email could not be sent".to_string())
    );
    assert_eq!(
        form.notification(),
        notification(NotificationKind::Error, "Email could not be sent")
    );
    // The fields survive a failed attempt
    assert_eq!(form.fields(), filled_in());
    assert!(!form.is_sending());
}

#[tokio::test]
async fn test_non_json_failure_body_falls_back_to_the_generic_message() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;
    let form = ContactForm::new(format!("{}/api/contact", mock_server.uri()));
    form.set_fields(filled_in());

    let outcome = form.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(FALLBACK_FAILURE_MESSAGE.to_string())
    );
    assert!(!form.is_sending());
}

#[tokio::test]
async fn test_network_failure_restores_the_form() {
    // Bind then release a port so nothing is listening on it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        listener.local_addr().unwrap().port()
    };
    let form = ContactForm::new(format!("http://127.0.0.1:{}/api/contact", port));
    form.set_fields(filled_in());

    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::NetworkFailure);
    assert_eq!(
        form.notification(),
        notification(NotificationKind::Error, NETWORK_FAILURE_MESSAGE)
    );
    assert_eq!(form.fields(), filled_in());
    assert!(!form.is_sending());
}
