//! Error taxonomy for the session lifecycle engine.

use thiserror::Error;

/// Transport-independent error classes; the HTTP layer maps each kind to a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Conflict,
    Forbidden,
    Internal,
}

/// Failures surfaced by engine operations.
///
/// Token-verification failures of any flavor (malformed, bad signature,
/// expired) are re-surfaced uniformly as `InvalidToken` with a readable
/// reason, never as panics or opaque faults. Collaborator failures (database,
/// network) travel through `Internal` and are not retried here.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("Email or password is incorrect")]
    EmailOrPasswordIncorrect,
    #[error("Google email not verified")]
    GoogleEmailNotVerified,
    #[error("Used refresh token or not exist")]
    UsedRefreshTokenOrNotExist,
    #[error("User not found")]
    UserNotFound,
    #[error("Email verify token is invalid")]
    EmailVerifyTokenIsInvalid,
    #[error("Forgot password token is invalid")]
    ForgotPasswordTokenIsInvalid,
    #[error("Password is incorrect")]
    PasswordIsIncorrect,
    #[error("Old password and new password must be different")]
    OldPasswordAndNewPasswordMustBeDifferent,
    #[error("{reason}")]
    InvalidToken { reason: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmailAlreadyExists => ErrorKind::Conflict,
            Self::EmailOrPasswordIncorrect
            | Self::UsedRefreshTokenOrNotExist
            | Self::EmailVerifyTokenIsInvalid
            | Self::ForgotPasswordTokenIsInvalid
            | Self::PasswordIsIncorrect
            | Self::InvalidToken { .. } => ErrorKind::Unauthorized,
            Self::GoogleEmailNotVerified => ErrorKind::Forbidden,
            Self::UserNotFound => ErrorKind::NotFound,
            Self::OldPasswordAndNewPasswordMustBeDifferent => ErrorKind::Validation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<crate::token::Error> for AuthError {
    fn from(err: crate::token::Error) -> Self {
        Self::InvalidToken {
            reason: err.to_string(),
        }
    }
}
