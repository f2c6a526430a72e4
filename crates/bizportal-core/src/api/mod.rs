//! REST API client module for the portal backend.
//!
//! This module provides the `RequestPipeline` that every backend call
//! passes through, and the `ApiClient` with typed `/Auth` endpoints.
//!
//! The API uses bearer token authentication. The token is issued by
//! `/Auth/Login` and read from the `CredentialStore` on every request.

pub mod client;
pub mod error;
pub mod pipeline;

pub use client::ApiClient;
pub use error::ApiError;
pub use pipeline::{RequestOptions, RequestPipeline};
