use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid expiration date '{0}': expected YYYY-MM or YYYY-MM-DD")]
    InvalidExpirationDate(String),

    #[error("Invalid role '{0}': must be one of admin, pharmacist, manufacturer")]
    InvalidRole(String),

    #[error("Invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}
