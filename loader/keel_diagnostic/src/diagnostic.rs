use std::fmt;

use crate::LoaderError;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// One reported condition: message, optional detail, severity.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code (`K0001`...), empty for free-form notes.
    pub code: &'static str,
    pub message: String,
    pub detail: Option<String>,
}

impl Diagnostic {
    /// A free-form diagnostic without a code.
    pub fn new(severity: Severity, message: impl Into<String>, detail: Option<String>) -> Self {
        Diagnostic {
            severity,
            code: "",
            message: message.into(),
            detail,
        }
    }
}

impl From<&LoaderError> for Diagnostic {
    fn from(err: &LoaderError) -> Self {
        Diagnostic {
            severity: err.severity(),
            code: err.code(),
            message: err.to_string(),
            detail: err.detail(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
        }
    }
}
