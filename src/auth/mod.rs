//! Accounts, credentials, and the session lifecycle engine.

pub mod email;
pub mod engine;
pub mod error;
pub mod issuer;
pub mod model;
pub mod oauth;
pub mod password;
pub mod postgres;
pub mod store;

pub use engine::AuthEngine;
pub use error::{AuthError, ErrorKind};
