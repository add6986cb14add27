use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrmError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    #[error("unauthorized: only admins can {operation}")]
    Unauthorized {
        operation: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: u64,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

impl CrmError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CrmError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(operation: impl Into<String>) -> Self {
        CrmError::Unauthorized {
            operation: operation.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: u64) -> Self {
        CrmError::NotFound { entity, id }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CrmError::Validation { .. })
    }

    /// offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            CrmError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
