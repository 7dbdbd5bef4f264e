use std::fmt;

#[derive(Debug)]
pub enum AppError {
    StorageUnavailable(String),
    Database(String),
    Delivery(String),
    NotFound(String),
    ValidationError(String),
    ConfigurationError(String),
    SerializationError(String),
    DeserializationError(String),
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Delivery(_) => "DELIVERY_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show in the foreground UI.
    pub fn user_message(&self) -> String {
        match self {
            AppError::StorageUnavailable(_) => {
                "Offline storage is unavailable; submissions will not be queued".to_string()
            }
            AppError::Delivery(msg) => {
                format!("Could not reach the server: {msg}")
            }
            AppError::NotFound(msg) | AppError::ValidationError(msg) => msg.clone(),
            _ => "An unexpected error occurred".to_string(),
        }
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Delivery(msg) => write!(f, "Delivery failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_unavailable_is_flagged_and_coded() {
        let err = AppError::StorageUnavailable("private mode".into());
        assert!(err.is_storage_unavailable());
        assert_eq!(err.code(), "STORAGE_UNAVAILABLE");
        assert_eq!(err.to_string(), "Storage unavailable: private mode");
    }

    #[test]
    fn internal_details_are_hidden_from_users() {
        let err = AppError::Database("disk I/O error".into());
        assert_eq!(err.user_message(), "An unexpected error occurred");

        let err = AppError::ValidationError("Trip ID is required".into());
        assert_eq!(err.user_message(), "Trip ID is required");
    }
}
