use thiserror::Error;

pub type AbacusResult<T> = Result<T, AbacusError>;

#[derive(Error, Debug)]
pub enum AbacusError {
    #[error("Invalid number '{input}': {reason}")]
    Validation { input: String, reason: String },

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("REPL error: {message}")]
    Repl { message: String },

    #[error("Command error: {message}")]
    Command { message: String },

    #[error("Observer '{observer}' failed: {message}")]
    Observer { observer: String, message: String },
}

/// Domain violations raised while selecting or evaluating an operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    #[error("Invalid root: {reason}")]
    InvalidRoot { reason: String },

    #[error("Invalid power: {reason}")]
    InvalidPower { reason: String },

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Numeric overflow in {operation}")]
    Overflow { operation: String },
}

/// Storage failures of the history file.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("History file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read history file {path} ({kind}): {message}")]
    ReadFailure { path: String, kind: String, message: String },

    #[error("Failed to parse history file {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to write history file {path}: {message}")]
    WriteFailure { path: String, message: String },
}

impl AbacusError {
    pub fn validation<S: Into<String>, R: Into<String>>(input: S, reason: R) -> Self {
        Self::Validation {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn repl<S: Into<String>>(message: S) -> Self {
        Self::Repl {
            message: message.into(),
        }
    }

    pub fn command<S: Into<String>>(message: S) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    pub fn observer<S: Into<String>, M: Into<String>>(observer: S, message: M) -> Self {
        Self::Observer {
            observer: observer.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error only aborts the current command in REPL mode
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AbacusError::Validation { .. }
                | AbacusError::Operation(_)
                | AbacusError::Persist(_)
                | AbacusError::Command { .. }
                | AbacusError::Observer { .. }
        )
    }

    /// Returns true if this error should cause the calculator to exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, AbacusError::Io(_))
    }
}

impl OperationError {
    pub fn invalid_root<S: Into<String>>(reason: S) -> Self {
        Self::InvalidRoot {
            reason: reason.into(),
        }
    }

    pub fn invalid_power<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPower {
            reason: reason.into(),
        }
    }

    pub fn unknown_operation<S: Into<String>>(name: S) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    pub fn overflow<S: Into<String>>(operation: S) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }
}

impl PersistError {
    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_failure<S: Into<String>>(path: S, error: &std::io::Error) -> Self {
        Self::ReadFailure {
            path: path.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    pub fn parse<S: Into<String>, M: Into<String>>(path: S, message: M) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write_failure<S: Into<String>, M: Into<String>>(path: S, message: M) -> Self {
        Self::WriteFailure {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(AbacusError::validation("abc", "not a number").is_recoverable());
        assert!(AbacusError::from(OperationError::DivisionByZero).is_recoverable());
        assert!(AbacusError::from(PersistError::file_not_found("x.json")).is_recoverable());
        assert!(!AbacusError::config("bad").is_recoverable());
        assert!(AbacusError::observer("audit-log", "disk full").is_recoverable());
        assert!(AbacusError::from(std::io::Error::other("disk")).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = AbacusError::from(OperationError::DivisionByZero);
        assert_eq!(err.to_string(), "Division by zero is not allowed");

        let err = AbacusError::validation("abc", "not a number");
        assert_eq!(err.to_string(), "Invalid number 'abc': not a number");
    }
}
