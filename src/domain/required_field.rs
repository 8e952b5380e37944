/// A form value that must be present.
///
/// Present means: supplied, and not empty once surrounding whitespace is
/// ignored. The value is kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField(String);

impl RequiredField {
    pub fn parse(value: Option<String>) -> Option<Self> {
        match value {
            Some(v) if is_present(&v) => Some(Self(v)),
            _ => None,
        }
    }
}

impl AsRef<str> for RequiredField {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
