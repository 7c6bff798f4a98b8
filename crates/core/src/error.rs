use crate::types::DbId;

/// Domain-level failures shared by the db and api layers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A request field failed its type, rule, or requirement check.
    #[error("Incorrect value for field \"{field}\": {message}")]
    InvalidField { field: String, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller lacks write access. The message is always generic so the
    /// response does not reveal which resource was refused.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Generic access-denied error used by every permission check.
    pub fn access_denied() -> Self {
        CoreError::Forbidden(
            "No permissions to referred object or it does not exist!".to_string(),
        )
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
