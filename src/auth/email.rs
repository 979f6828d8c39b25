//! Outbound email abstraction.
//!
//! The engine treats email as fire-and-forget: delivery failures are logged
//! and never surface as operation failures. The default sender for local dev
//! is `LogEmailSender`, which logs the payload and returns `Ok(())`; a real
//! deployment implements `EmailSender` against SMTP or a delivery API.

use anyhow::Result;
use tracing::info;

/// Email delivery abstraction used by the session lifecycle engine.
pub trait EmailSender: Send + Sync {
    /// Deliver the verification link email carrying `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers only log it.
    fn send_verify_email(&self, email: &str, token: &str) -> Result<()>;

    /// Deliver the password-reset email carrying `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers only log it.
    fn send_forgot_password_email(&self, email: &str, token: &str) -> Result<()>;
}

/// Local dev sender that logs instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send_verify_email(&self, email: &str, token: &str) -> Result<()> {
        info!(to_email = %email, token = %token, "verify email send stub");
        Ok(())
    }

    fn send_forgot_password_email(&self, email: &str, token: &str) -> Result<()> {
        info!(to_email = %email, token = %token, "forgot password email send stub");
        Ok(())
    }
}
