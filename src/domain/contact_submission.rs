use crate::domain::RequiredField;
use crate::routes::FormData;

/// A validated name/email/message triple, ready to be relayed.
///
/// The email is only checked for presence: whatever the visitor typed is
/// used as the reply-to target.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: RequiredField,
    pub email: RequiredField,
    pub message: RequiredField,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Missing name, email or message")]
pub struct SubmissionError {
    /// Names of the fields that were absent or blank.
    pub missing: Vec<&'static str>,
}

impl TryFrom<FormData> for ContactSubmission {
    type Error = SubmissionError;

    fn try_from(form: FormData) -> Result<Self, Self::Error> {
        let name = RequiredField::parse(form.name);
        let email = RequiredField::parse(form.email);
        let message = RequiredField::parse(form.message);

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => Ok(Self {
                name,
                email,
                message,
            }),
            (name, email, message) => {
                let missing = [
                    ("name", name.is_none()),
                    ("email", email.is_none()),
                    ("message", message.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, is_missing)| is_missing.then(|| field))
                .collect();
                Err(SubmissionError { missing })
            }
        }
    }
}
