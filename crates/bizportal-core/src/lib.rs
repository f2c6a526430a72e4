//! Session, credential and request-pipeline core for the bizportal
//! administrative front end.
//!
//! The pieces, leaf first:
//! - `storage`: key/value slots (memory, JSON file, OS keychain)
//! - `auth::CredentialStore`: the single bearer credential
//! - `api::RequestPipeline`: credential injection and failure classification
//! - `auth::Session`: sign-in state and the authenticated check
//! - `navigation`: the route table and pre-navigation guard
//!
//! `context::PortalContext` wires them together for a front end.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod localization;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod storage;

pub use api::{ApiClient, ApiError, RequestOptions, RequestPipeline};
pub use auth::{AccountOutcome, AuthError, CredentialStore, PersistenceMode, Session, SessionState};
pub use config::Config;
pub use context::PortalContext;
pub use localization::{Language, Localizer};
pub use models::{LoginRequest, MenuItem, Organization, UserRecord};
pub use navigation::{NavigationDecision, NavigationGuard, NavigationOutcome, RouteTable};
pub use notify::{LogNotifier, Notification, Notifier, ToastQueue};
