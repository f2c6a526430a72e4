use thiserror::Error;

use crate::api::ApiError;

/// Failure of a session operation, ready to show to the user.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend answered but the payload lacked what we needed
    #[error("{0}")]
    InvalidResponse(String),

    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl AuthError {
    /// Wrap a classified request failure, preferring the server's message
    /// over the localized `fallback`.
    pub fn from_api(source: ApiError, fallback: String) -> Self {
        let message = source
            .server_message()
            .map(str::to_string)
            .unwrap_or(fallback);
        AuthError::Request { message, source }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AuthError::Request { source, .. } => Some(source),
            AuthError::InvalidResponse(_) => None,
        }
    }
}
