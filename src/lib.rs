//! # Aviary (Social Network Backend)
//!
//! `aviary` is a social-network backend whose core is the authentication and
//! session-token lifecycle engine: issuance, verification, one-time
//! consumption, and rotation of four signed token kinds (access, refresh,
//! email-verify, forgot-password), plus Google OAuth federation.
//!
//! ## Token Model
//!
//! Every token is a compact HS256 JWT carrying the user id, the token kind,
//! a verification-status snapshot, and `iat`/`exp` timestamps. Each kind is
//! signed with its own key, so a token can never be replayed across kinds.
//!
//! - **Access tokens** are stateless bearer credentials; they are never
//!   persisted and expire purely by `exp`.
//! - **Refresh tokens** are persisted per device. A refresh token is valid
//!   only while its row exists; rotation consumes the row atomically and the
//!   replacement token keeps the *original* absolute expiry, so a rotation
//!   chain can never outlive the session that started it.
//! - **Email-verify and forgot-password tokens** live in a single field on
//!   the user record. Issuing a new one overwrites the field and silently
//!   invalidates its predecessor; consuming one clears the field.
//!
//! ## Accounts
//!
//! Users start `unverified` and become `verified` through the email-verify
//! flow; `banned` is an administrative state this engine never produces.
//! Google OAuth logins reuse the password flows with a random, unguessable
//! password generated at registration time.

pub mod api;
pub mod auth;
pub mod cli;
pub mod token;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
