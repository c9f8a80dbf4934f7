//! Error types and result types for data mapper operations.
//!
//! Construction failures surface as [`DataMapperError::Configuration`], driver failures
//! as [`DataMapperError::Connection`] (lifecycle) or [`DataMapperError::Operation`] (CRUD).
//! Use [`DataMapperResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when working with a data mapper.
#[derive(Error, Debug)]
pub enum DataMapperError {
    /// Required configuration is missing or invalid. Only raised while building a mapper.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The driver failed to open or close a connection.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The driver failed while executing a CRUD operation.
    #[error("Operation error: {0}")]
    Operation(String),
    /// Serialization/deserialization error when converting between formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A collection operation or `destroy` was issued before `initialize`.
    #[error("Data mapper is not initialized")]
    NotInitialized,
    /// `initialize` was issued on a mapper that already holds a connection.
    #[error("Data mapper is already initialized")]
    AlreadyInitialized,
}

impl DataMapperError {
    /// Creates a configuration error for a missing option.
    pub fn missing(option: &str) -> Self {
        DataMapperError::Configuration(format!("`{option}` is missing."))
    }

    /// Returns `true` if this error was raised at construction time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DataMapperError::Configuration(_))
    }
}

/// A specialized `Result` type for data mapper operations.
pub type DataMapperResult<T> = Result<T, DataMapperError>;

impl From<BsonError> for DataMapperError {
    fn from(err: BsonError) -> Self {
        DataMapperError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DataMapperError {
    fn from(err: SerdeJsonError) -> Self {
        DataMapperError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_option_message() {
        let err = DataMapperError::missing("options.connection_uri");

        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: `options.connection_uri` is missing."
        );
    }

    #[test]
    fn test_lifecycle_errors_are_not_configuration() {
        assert!(!DataMapperError::NotInitialized.is_configuration());
        assert!(!DataMapperError::Connection("refused".into()).is_configuration());
    }
}
