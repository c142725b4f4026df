use shared::{
    domain::PermissionLevel,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

/// Failure of a single call against the moderation API.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn from_api(error: ApiError) -> Self {
        match error.code {
            code if code.is_permission_denied() => Self::PermissionDenied(error.message),
            ErrorCode::NotFound => Self::NotFound(error.message),
            code => Self::Rejected {
                code,
                message: error.message,
            },
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        if let Some(status) = value.status() {
            return Self::from_api(ApiError::new(
                ErrorCode::from_status(status.as_u16()),
                value.to_string(),
            ));
        }
        Self::Transport(value.to_string())
    }
}

/// Failure of a user-initiated view action.
#[derive(Debug, Clone, Error)]
pub enum ViewError {
    #[error("action requires {required:?} permission")]
    Forbidden { required: PermissionLevel },
    #[error("view has no loaded entity")]
    NotLoaded,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
