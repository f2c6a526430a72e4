//! Data models exchanged with the backend.
//!
//! - `LoginRequest`, `LoginResponse`: the sign-in exchange
//! - `UserRecord`: the cached profile of the signed-in user
//! - `MenuItem`: navigation menu tree
//! - `Organization`: org codes offered on the login form

pub mod login;
pub mod menu;
pub mod organization;
pub mod user;

pub use login::{LoginRequest, LoginResponse};
pub use menu::MenuItem;
pub use organization::Organization;
pub use user::UserRecord;
