//! Token issuance with per-kind keys and lifetimes.

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::auth::model::VerifyStatus;
use crate::token::{self, TokenKind, TokenPayload};

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 100 * 24 * 60 * 60;
const DEFAULT_EMAIL_VERIFY_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_FORGOT_PASSWORD_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// One signing key per token kind; a leaked key only compromises its kind.
pub struct TokenKeys {
    pub access: SecretString,
    pub refresh: SecretString,
    pub email_verify: SecretString,
    pub forgot_password: SecretString,
}

/// A freshly signed token together with the timestamps baked into it.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub iat: i64,
    pub exp: i64,
}

/// Access/refresh pair issued together; both carry the same user id and
/// verification-status snapshot.
#[derive(Debug, Clone)]
pub struct SessionPair {
    pub access: SignedToken,
    pub refresh: SignedToken,
}

pub struct TokenIssuer {
    keys: TokenKeys,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    email_verify_ttl_seconds: i64,
    forgot_password_ttl_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(keys: TokenKeys) -> Self {
        Self {
            keys,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            email_verify_ttl_seconds: DEFAULT_EMAIL_VERIFY_TTL_SECONDS,
            forgot_password_ttl_seconds: DEFAULT_FORGOT_PASSWORD_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_verify_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_verify_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_forgot_password_ttl_seconds(mut self, seconds: i64) -> Self {
        self.forgot_password_ttl_seconds = seconds;
        self
    }

    fn key_for(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::AccessToken => self.keys.access.expose_secret().as_bytes(),
            TokenKind::RefreshToken => self.keys.refresh.expose_secret().as_bytes(),
            TokenKind::EmailVerifyToken => self.keys.email_verify.expose_secret().as_bytes(),
            TokenKind::ForgotPasswordToken => {
                self.keys.forgot_password.expose_secret().as_bytes()
            }
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::AccessToken => self.access_ttl_seconds,
            TokenKind::RefreshToken => self.refresh_ttl_seconds,
            TokenKind::EmailVerifyToken => self.email_verify_ttl_seconds,
            TokenKind::ForgotPasswordToken => self.forgot_password_ttl_seconds,
        }
    }

    fn issue(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        verify: VerifyStatus,
        absolute_exp: Option<i64>,
    ) -> Result<SignedToken, token::Error> {
        let iat = token::unix_now();
        // Absolute expiry is only supplied when rotating a refresh token; it
        // pins the chain to the original session lifetime.
        let exp = absolute_exp.unwrap_or_else(|| iat.saturating_add(self.ttl_for(kind)));
        let payload = TokenPayload {
            user_id,
            kind,
            verify,
            iat,
            exp,
        };
        let token = token::sign_hs256(self.key_for(kind), &payload)?;
        Ok(SignedToken { token, iat, exp })
    }

    /// Short-lived stateless bearer token; never persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_access(
        &self,
        user_id: Uuid,
        verify: VerifyStatus,
    ) -> Result<SignedToken, token::Error> {
        self.issue(user_id, TokenKind::AccessToken, verify, None)
    }

    /// Refresh token; `existing_exp` pins the absolute expiry when rotating.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        verify: VerifyStatus,
        existing_exp: Option<i64>,
    ) -> Result<SignedToken, token::Error> {
        self.issue(user_id, TokenKind::RefreshToken, verify, existing_exp)
    }

    /// Issue the access/refresh pair for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if signing either token fails.
    pub fn issue_session_pair(
        &self,
        user_id: Uuid,
        verify: VerifyStatus,
        existing_exp: Option<i64>,
    ) -> Result<SessionPair, token::Error> {
        let access = self.issue_access(user_id, verify)?;
        let refresh = self.issue_refresh(user_id, verify, existing_exp)?;
        Ok(SessionPair { access, refresh })
    }

    /// One-time email-verification token; always snapshots `Unverified`.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_email_verify(&self, user_id: Uuid) -> Result<SignedToken, token::Error> {
        self.issue(
            user_id,
            TokenKind::EmailVerifyToken,
            VerifyStatus::Unverified,
            None,
        )
    }

    /// One-time forgot-password token.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_forgot_password(
        &self,
        user_id: Uuid,
        verify: VerifyStatus,
    ) -> Result<SignedToken, token::Error> {
        self.issue(user_id, TokenKind::ForgotPasswordToken, verify, None)
    }

    /// Verify a token under the key for `kind` and require the payload's
    /// `type` claim to match.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed tokens, bad signatures, expiry, or a
    /// kind mismatch.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenPayload, token::Error> {
        let payload = token::verify_hs256(token, self.key_for(kind), token::unix_now())?;
        if payload.kind != kind {
            return Err(token::Error::KindMismatch);
        }
        Ok(payload)
    }
}
