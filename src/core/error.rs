use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Read of '{path}' failed: {message}")]
    Read { path: String, message: String },

    #[error("Write to '{path}' failed: {message}")]
    Write { path: String, message: String },

    #[error("Path '{0}' not found")]
    NotFound(String),

    #[error("Unexpected data at '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl StoreError {
    pub fn read(path: impl ToString, message: impl ToString) -> Self {
        Self::Read {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn write(path: impl ToString, message: impl ToString) -> Self {
        Self::Write {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn decode(path: impl ToString, message: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_path() {
        let err = StoreError::write("managers/bob", "HTTP 500");
        assert_eq!(err.to_string(), "Write to 'managers/bob' failed: HTTP 500");

        let err = StoreError::read("loans", "timed out");
        assert!(err.to_string().contains("loans"));
    }
}
