//! The request pipeline every backend call goes through.
//!
//! Attaches the stored bearer credential, classifies failures into
//! `ApiError`, raises one notification per failure, and hands the failure
//! back to the caller. A 401 clears the stored credential before returning.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::notify::{Notification, Notifier};

use super::ApiError;

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

pub struct RequestPipeline {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    notifier: Arc<dyn Notifier>,
}

impl RequestPipeline {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            notifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request and return the response body.
    ///
    /// Empty bodies come back as `Value::Null`, bodies that are not JSON as
    /// `Value::String`. Failures are classified, notified, and returned.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        match self.dispatch(&method, path, body, options).await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(&method, path, err)),
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(header::CONTENT_TYPE, "application/json");

        let authenticated = match self.credentials.get() {
            Some(token) => {
                request = request.bearer_auth(token);
                true
            }
            None => false,
        };

        if let Some(options) = options {
            if !options.query.is_empty() {
                request = request.query(&options.query);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path = path, authenticated, "HTTP request");

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::from_transport)?;

        debug!(method = %method, path = path, status = %status, "HTTP response");

        if !status.is_success() {
            debug!(body = %ApiError::truncate_body(&text), "HTTP error body");
            return Err(ApiError::from_status(status, &text));
        }

        Ok(parse_body(text))
    }

    /// Apply failure side effects, then hand the error back.
    fn fail(&self, method: &Method, path: &str, err: ApiError) -> ApiError {
        if err.is_unauthorized() {
            self.credentials.clear();
            warn!(path = path, "Credential rejected by server, cleared");
        }

        match err {
            ApiError::Network { ref source } => {
                warn!(method = %method, path = path, error = %source, "Request failed without a response");
            }
            _ => {
                warn!(method = %method, path = path, status = ?err.status(), error = %err, "Request failed");
            }
        }

        self.notifier.notify(Notification::error(err.user_message()));
        err
    }

    fn encode_body<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| {
            self.fail(
                method,
                path,
                ApiError::Client {
                    message: format!("Failed to encode request body: {}", e),
                },
            )
        })
    }

    async fn send_typed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        let value = self.send(method, path, body, options).await?;
        decode(path, value)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        self.send_typed(Method::GET, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = self.encode_body(&Method::POST, path, body)?;
        self.send_typed(Method::POST, path, Some(&body), None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = self.encode_body(&Method::PUT, path, body)?;
        self.send_typed(Method::PUT, path, Some(&body), None).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = self.encode_body(&Method::PATCH, path, body)?;
        self.send_typed(Method::PATCH, path, Some(&body), None).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        self.send_typed(Method::DELETE, path, None, options).await
    }
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Decode a success body into `T`. The transport succeeded, so a mismatch
/// is reported as `InvalidResponse` without a notification.
pub(crate) fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        warn!(path = path, error = %e, "Unexpected response shape");
        ApiError::InvalidResponse(format!("{}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastQueue;
    use serde_json::json;

    fn pipeline(base_url: &str) -> RequestPipeline {
        RequestPipeline::new(
            base_url,
            Duration::from_secs(1),
            Arc::new(CredentialStore::in_memory()),
            Arc::new(ToastQueue::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let p = pipeline("https://localhost:7117/api/");
        assert_eq!(p.base_url(), "https://localhost:7117/api");
        assert_eq!(p.url("/Auth/Login"), "https://localhost:7117/api/Auth/Login");
        assert_eq!(p.url("Auth/Login"), "https://localhost:7117/api/Auth/Login");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), Value::Null);
        assert_eq!(parse_body("  ".to_string()), Value::Null);
        assert_eq!(parse_body(r#"{"token":"abc"}"#.to_string()), json!({"token": "abc"}));
        assert_eq!(parse_body("OK".to_string()), json!("OK"));
    }

    #[test]
    fn test_decode_mismatch_is_invalid_response() {
        let err = decode::<Vec<String>>("/Auth/GetOrgs", json!({"a": 1})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
