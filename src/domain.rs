mod contact_submission;
mod required_field;

pub use contact_submission::{ContactSubmission, SubmissionError};
pub use required_field::{is_present, RequiredField};
