use std::fmt;

use vex_core::{StoreError, VectorLiteralError};

/// A failed command; rendered to the client as `-ERR <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandError {
    code: &'static str,
    message: String,
}

impl CommandError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_argument",
            message: message.into(),
        }
    }

    pub(crate) fn wrong_arity(command: &str) -> Self {
        Self {
            code: "wrong_arity",
            message: format!(
                "wrong number of arguments for '{}' command",
                command.to_ascii_lowercase()
            ),
        }
    }

    pub(crate) fn unknown_command(command: &str) -> Self {
        Self {
            code: "unknown_command",
            message: format!("unknown command '{command}'"),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "internal",
            message: message.into(),
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        self.code
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<StoreError> for CommandError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InvalidConfig(_) => Self::internal(error.to_string()),
            StoreError::DimensionMismatch { .. }
            | StoreError::ZeroVector
            | StoreError::NonFiniteValue { .. } => Self::invalid_argument(error.to_string()),
        }
    }
}

impl From<VectorLiteralError> for CommandError {
    fn from(error: VectorLiteralError) -> Self {
        Self::invalid_argument(format!("invalid vector format: {error}"))
    }
}
