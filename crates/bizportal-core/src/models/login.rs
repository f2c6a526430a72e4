use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sign-in form contents as sent to `/Auth/Login`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub orgcode: String,
    pub usercode: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basedate: Option<NaiveDate>,
    /// Keep the credential across restarts. Never sent to the backend.
    #[serde(skip)]
    pub remember_me: bool,
}

impl LoginRequest {
    pub fn new(usercode: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            usercode: usercode.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_orgcode(mut self, orgcode: impl Into<String>) -> Self {
        self.orgcode = orgcode.into();
        self
    }

    pub fn with_basedate(mut self, basedate: NaiveDate) -> Self {
        self.basedate = Some(basedate);
        self
    }

    pub fn remember_me(mut self, remember: bool) -> Self {
        self.remember_me = remember;
        self
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("orgcode", &self.orgcode)
            .field("usercode", &self.usercode)
            .field("password", &"<redacted>")
            .field("basedate", &self.basedate)
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Payload of a login or token refresh. Anything besides the token is kept
/// as-is for callers that want it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LoginResponse {
    /// Decode a response body. Bodies that are not objects, or whose
    /// `token` is not a string, decode to a response without a token.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// The issued credential, if the payload carried a non-empty one
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
