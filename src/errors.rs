use sea_orm::error::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    pub fn not_found(entity: &str, id: i32) -> Self {
        ServiceError::NotFound(format!("{} with ID {} not found", entity, id))
    }

    /// True for rejections of user input made before any store mutation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InvalidInput(_))
    }

    /// Message suitable for showing to the person at the keyboard.
    /// Driver level detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError(DbErr::Conn(_))
            | Self::DatabaseError(DbErr::ConnectionAcquire(_)) => {
                "Could not connect to the database. Check APP__DATABASE_URL and try again."
                    .to_string()
            }
            Self::DatabaseError(_) => "Database error. See the log for details.".to_string(),
            Self::MigrationError(_) => {
                "Could not prepare the database schema. See the log for details.".to_string()
            }
            Self::Other(_) => "Unexpected error. See the log for details.".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type AppError = ServiceError;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn validation_errors_map_to_validation_variant() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("required"));

        let err: ServiceError = errors.into();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Validation error:"));
    }

    #[test]
    fn user_message_hides_database_details() {
        let err = ServiceError::db_error("no such table: sales");
        assert_eq!(err.user_message(), "Database error. See the log for details.");
        assert!(!err.is_validation());
    }

    #[test]
    fn user_message_keeps_user_facing_text() {
        assert_eq!(
            ServiceError::not_found("Product", 7).user_message(),
            "Not found: Product with ID 7 not found"
        );
        assert_eq!(
            ServiceError::ValidationError("Name is required".into()).user_message(),
            "Validation error: Name is required"
        );
    }
}
