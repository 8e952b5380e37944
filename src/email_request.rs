use crate::contact_email::OutboundEmail;

/// Body of `POST /email` on a Postmark-compatible mail API.
#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct SendEmailRequest<'a> {
    pub from: String,
    pub reply_to: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub text_body: &'a str,
    pub html_body: &'a str,
}

impl<'a> From<&'a OutboundEmail> for SendEmailRequest<'a> {
    fn from(email: &'a OutboundEmail) -> Self {
        Self {
            from: email.from_header(),
            reply_to: &email.reply_to,
            to: &email.recipient,
            subject: &email.subject,
            text_body: &email.text_body,
            html_body: &email.html_body,
        }
    }
}

/// Error payload returned by the mail API for rejected calls.
#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error_code: i64,
    pub message: String,
}
