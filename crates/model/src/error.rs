use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("unsupported cursor type: {0}")]
    UnsupportedType(String),

    #[error("unable to convert '{input}' to cursor type {cursor_type}: {reason}")]
    Conversion {
        cursor_type: String,
        input: String,
        reason: String,
    },

    #[error("unable to compare {left} and {right} as {cursor_type}")]
    Mismatch {
        cursor_type: String,
        left: String,
        right: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no parameters found in key/value: {0}")]
    NoPlaceholders(String),
}
