//! Authentication module for managing the user session and its credential.
//!
//! This module provides:
//! - `Session`: sign-in, sign-out, profile caching and the authenticated check
//! - `CredentialStore`: the single bearer credential, in a durable or an
//!   ephemeral slot
//! - `AuthError`: session failures with UI-ready messages
//!
//! The profile is never persisted. Only the credential outlives the process,
//! and only when the user asked to be remembered.

pub mod credentials;
pub mod error;
pub mod session;

pub use credentials::{CredentialStore, PersistenceMode, TOKEN_KEY};
pub use error::AuthError;
pub use session::{AccountOutcome, Session, SessionState};
