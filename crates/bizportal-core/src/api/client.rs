//! Typed client for the portal backend's `/Auth` endpoints.
//!
//! Every call goes through the shared `RequestPipeline`, so credential
//! injection and failure notification happen in one place.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::auth::CredentialStore;
use crate::localization::Language;
use crate::models::{LoginRequest, LoginResponse, MenuItem, Organization, UserRecord};

use super::pipeline::{decode, RequestOptions, RequestPipeline};
use super::ApiError;

// ============================================================================
// Endpoints
// ============================================================================

const LOGIN_PATH: &str = "/Auth/Login";
const LOGOUT_PATH: &str = "/Auth/Logout";
const REFRESH_TOKEN_PATH: &str = "/Auth/RefreshToken";
const USER_INFO_PATH: &str = "/Auth/UserInfo";
const MENU_ITEMS_PATH: &str = "/Auth/GetMenuItems";
const ORGS_PATH: &str = "/Auth/GetOrgs";

/// Query parameter carrying the UI language for menu labels
const LANGUAGE_PARAM: &str = "language";

/// API client for the portal backend.
/// Clone is cheap - the pipeline is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<RequestPipeline>,
}

impl ApiClient {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.pipeline.credentials()
    }

    /// Submit sign-in credentials. A success status with a body that holds
    /// no token is returned as-is; the caller decides what that means.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body: Value = self.pipeline.post(LOGIN_PATH, request).await?;
        Ok(LoginResponse::from_value(body))
    }

    /// Tell the backend the session is over
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.pipeline
            .send(Method::POST, LOGOUT_PATH, Some(&json!({})), None)
            .await?;
        Ok(())
    }

    /// Exchange the current credential for a fresh one
    pub async fn refresh_token(&self) -> Result<LoginResponse, ApiError> {
        let body = self
            .pipeline
            .send(Method::POST, REFRESH_TOKEN_PATH, Some(&json!({})), None)
            .await?;
        Ok(LoginResponse::from_value(body))
    }

    /// Fetch the signed-in user's profile
    pub async fn user_info(&self) -> Result<UserRecord, ApiError> {
        self.pipeline.get(USER_INFO_PATH, None).await
    }

    /// Fetch the menu tree the user may see, labelled in `language`
    pub async fn menu_items(&self, language: Language) -> Result<Vec<MenuItem>, ApiError> {
        let options = RequestOptions::new().query(LANGUAGE_PARAM, language.code());
        let body = self
            .pipeline
            .send(Method::GET, MENU_ITEMS_PATH, None, Some(&options))
            .await?;

        // Some deployments answer with no body when the user has no menu
        if body.is_null() {
            return Ok(Vec::new());
        }
        decode(MENU_ITEMS_PATH, body)
    }

    /// Fetch the organizations offered on the sign-in form
    pub async fn orgs(&self) -> Result<Vec<Organization>, ApiError> {
        self.pipeline.get(ORGS_PATH, None).await
    }
}
