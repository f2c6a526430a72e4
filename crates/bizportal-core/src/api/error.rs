use serde::Deserialize;
use thiserror::Error;

const BAD_REQUEST_TEXT: &str = "Bad request. Please check your input data.";
const UNAUTHORIZED_TEXT: &str = "Unauthorized access. Please login again.";
const FORBIDDEN_TEXT: &str = "Access forbidden.";
const NOT_FOUND_TEXT: &str = "Resource not found.";
const SERVER_ERROR_TEXT: &str = "Internal server error.";
const NETWORK_TEXT: &str = "Network error. Please check your connection.";
const UNKNOWN_TEXT: &str = "Unknown error occurred.";

/// A classified request failure.
///
/// `Display` is the user-facing text: the server-supplied message when the
/// response body carried one, otherwise a status-specific default.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", message_or(.server_message, BAD_REQUEST_TEXT))]
    BadRequest { server_message: Option<String> },

    #[error("{}", message_or(.server_message, UNAUTHORIZED_TEXT))]
    Unauthorized { server_message: Option<String> },

    #[error("{}", message_or(.server_message, FORBIDDEN_TEXT))]
    Forbidden { server_message: Option<String> },

    #[error("{}", message_or(.server_message, NOT_FOUND_TEXT))]
    NotFound { server_message: Option<String> },

    #[error("{}", message_or(.server_message, SERVER_ERROR_TEXT))]
    ServerError { server_message: Option<String> },

    #[error("{}", other_status_message(.status, .server_message))]
    OtherStatus {
        status: u16,
        server_message: Option<String>,
    },

    /// The request was sent but no response came back (includes timeouts)
    #[error("{}", NETWORK_TEXT)]
    Network {
        #[source]
        source: reqwest::Error,
    },

    /// The request was never sent
    #[error("{}", client_message(.message))]
    Client { message: String },

    /// The call succeeded but the payload was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn message_or(server_message: &Option<String>, default: &str) -> String {
    server_message
        .as_deref()
        .unwrap_or(default)
        .to_string()
}

fn other_status_message(status: &u16, server_message: &Option<String>) -> String {
    match server_message {
        Some(message) => message.clone(),
        None => format!("Error: {}", status),
    }
}

fn client_message(message: &str) -> &str {
    if message.is_empty() {
        UNKNOWN_TEXT
    } else {
        message
    }
}

/// Error bodies the backend sends alongside a failure status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `message` field out of a JSON error body, if there is one.
    fn extract_server_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let server_message = Self::extract_server_message(body);
        match status.as_u16() {
            400 => ApiError::BadRequest { server_message },
            401 => ApiError::Unauthorized { server_message },
            403 => ApiError::Forbidden { server_message },
            404 => ApiError::NotFound { server_message },
            500 => ApiError::ServerError { server_message },
            code => ApiError::OtherStatus {
                status: code,
                server_message,
            },
        }
    }

    /// Classify a transport error from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Client {
                message: err.to_string(),
            }
        } else {
            ApiError::Network { source: err }
        }
    }

    /// HTTP status for status-classified failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServerError { .. } => Some(500),
            ApiError::OtherStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the server in the error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { server_message }
            | ApiError::Unauthorized { server_message }
            | ApiError::Forbidden { server_message }
            | ApiError::NotFound { server_message }
            | ApiError::ServerError { server_message }
            | ApiError::OtherStatus { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }

    /// Text shown to the user for this failure
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        let cases = [
            (400, Some(400)),
            (401, Some(401)),
            (403, Some(403)),
            (404, Some(404)),
            (500, Some(500)),
            (502, Some(502)),
            (429, Some(429)),
        ];
        for (code, expected) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(ApiError::from_status(status, "").status(), expected);
        }

        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::OtherStatus { status: 502, .. }
        ));
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
    }

    #[test]
    fn test_default_messages() {
        let msg = |code: u16| {
            ApiError::from_status(StatusCode::from_u16(code).unwrap(), "not json").user_message()
        };
        assert_eq!(msg(400), BAD_REQUEST_TEXT);
        assert_eq!(msg(401), UNAUTHORIZED_TEXT);
        assert_eq!(msg(403), FORBIDDEN_TEXT);
        assert_eq!(msg(404), NOT_FOUND_TEXT);
        assert_eq!(msg(500), SERVER_ERROR_TEXT);
        assert_eq!(msg(418), "Error: 418");
    }

    #[test]
    fn test_server_message_overrides_default() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Usercode is required"}"#,
        );
        assert_eq!(err.server_message(), Some("Usercode is required"));
        assert_eq!(err.user_message(), "Usercode is required");

        let blank = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"message": "  "}"#);
        assert_eq!(blank.server_message(), None);
        assert_eq!(blank.user_message(), FORBIDDEN_TEXT);
    }

    #[test]
    fn test_client_error_message() {
        let err = ApiError::Client {
            message: String::new(),
        };
        assert_eq!(err.user_message(), UNKNOWN_TEXT);

        let err = ApiError::Client {
            message: "relative URL without a base".to_string(),
        };
        assert_eq!(err.user_message(), "relative URL without a base");
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }
}
