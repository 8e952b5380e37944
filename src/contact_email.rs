use crate::domain::ContactSubmission;

/// A fully rendered email, independent of the transport that delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub sender_label: String,
    pub sender_account: String,
    pub reply_to: String,
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutboundEmail {
    /// `"Label" <account>` form of the sender.
    pub fn from_header(&self) -> String {
        format!("\"{}\" <{}>", self.sender_label, self.sender_account)
    }
}

/// How contact submissions are turned into emails for the site owner.
///
/// The owner's account is both sender and recipient; the visitor's address
/// only appears as reply-to, so answering the email reaches the visitor.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub sender_account: String,
    pub sender_label: String,
    /// Escape visitor-supplied text before it is placed in the HTML body.
    pub sanitize_html: bool,
}

impl MessageTemplate {
    pub fn render(&self, submission: &ContactSubmission) -> OutboundEmail {
        let name = submission.name.as_ref();
        let email = submission.email.as_ref();
        let message = submission.message.as_ref();

        let text_body = format!("Name: {}\nEmail: {}\n\nMessage:\n{}\n", name, email, message);

        let html_body = if self.sanitize_html {
            html_body(
                &escape_html(name),
                &escape_html(email),
                &escape_html(message),
            )
        } else {
            html_body(name, email, message)
        };

        OutboundEmail {
            sender_label: self.sender_label.clone(),
            sender_account: self.sender_account.clone(),
            reply_to: email.to_owned(),
            recipient: self.sender_account.clone(),
            subject: format!("New message from {}", name),
            text_body,
            html_body,
        }
    }
}

/// Escape the characters that are significant in HTML text and attributes.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_body(name: &str, email: &str, message: &str) -> String {
    format!(
        "<p><strong>Name:</strong> {}</p>\n\
         <p><strong>Email:</strong> {}</p>\n\
         <p><strong>Message:</strong></p>\n\
         <p>{}</p>",
        name, email, message
    )
}
