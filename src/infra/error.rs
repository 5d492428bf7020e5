use thiserror::Error;

/// Errors that can occur during application startup.
///
/// Display messages are safe for logs; Debug includes the `#[source]` chain,
/// which may contain connection strings.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: {var} is invalid: {reason}")]
    ConfigInvalid { var: &'static str, reason: String },

    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}
