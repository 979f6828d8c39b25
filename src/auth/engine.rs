//! Session lifecycle engine.
//!
//! Orchestrates registration, login, refresh rotation, logout, email
//! verification, and the password flows over injected collaborator handles.
//! The engine owns no global state; construct one per process (or per
//! request) with whatever store implementations the host provides.

use anyhow::{Context, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::auth::email::EmailSender;
use crate::auth::error::AuthError;
use crate::auth::issuer::{SessionPair, TokenIssuer};
use crate::auth::model::{RefreshTokenRecord, User, UserFields, VerifyStatus};
use crate::auth::oauth::IdentityProvider;
use crate::auth::password::PasswordHasher;
use crate::auth::store::{RefreshTokenStore, UserStore};
use crate::token::{TokenKind, TokenPayload, unix_now};

/// Access/refresh pair handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a federated login.
#[derive(Debug, Clone)]
pub struct FederatedLogin {
    pub tokens: SessionTokens,
    pub new_user: bool,
    pub verify: VerifyStatus,
}

/// Verify-email distinguishes real verification from the friendly no-op when
/// the link is clicked a second time (email scanners do this).
#[derive(Debug, Clone)]
pub enum VerifyEmailOutcome {
    Verified(SessionTokens),
    AlreadyVerified,
}

/// Resend outcome; already-verified accounts get a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyVerified,
}

/// User view with credential and one-time-token fields projected out.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub verify: VerifyStatus,
    pub created_at: i64,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            verify: user.verify,
            created_at: user.created_at,
        }
    }
}

pub struct AuthEngine {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    issuer: TokenIssuer,
    passwords: PasswordHasher,
    mailer: Arc<dyn EmailSender>,
    identity: Arc<dyn IdentityProvider>,
}

impl AuthEngine {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        issuer: TokenIssuer,
        passwords: PasswordHasher,
        mailer: Arc<dyn EmailSender>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            issuer,
            passwords,
            mailer,
            identity,
        }
    }

    /// Persist the refresh half of a freshly issued pair.
    async fn persist_session(
        &self,
        user_id: Uuid,
        pair: &SessionPair,
    ) -> Result<SessionTokens, AuthError> {
        self.refresh_tokens
            .insert(RefreshTokenRecord {
                user_id,
                token: pair.refresh.token.clone(),
                iat: pair.refresh.iat,
                exp: pair.refresh.exp,
            })
            .await
            .context("failed to persist refresh token")?;
        Ok(SessionTokens {
            access_token: pair.access.token.clone(),
            refresh_token: pair.refresh.token.clone(),
        })
    }

    /// Create an unverified account, start a session, and send the
    /// verification email.
    ///
    /// # Errors
    ///
    /// `EmailAlreadyExists` when the address is taken; `Internal` for store
    /// failures.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, AuthError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user_id = Uuid::new_v4();
        let email_verify = self.issuer.issue_email_verify(user_id)?;
        let now = unix_now();
        self.users
            .insert(User {
                id: user_id,
                name: name.to_string(),
                email: email.to_string(),
                username: format!("user_{}", user_id.simple()),
                password_hash: self.passwords.hash(password),
                verify: VerifyStatus::Unverified,
                email_verify_token: email_verify.token.clone(),
                forgot_password_token: String::new(),
                created_at: now,
                updated_at: now,
            })
            .await
            .context("failed to insert user")?;

        let pair = self
            .issuer
            .issue_session_pair(user_id, VerifyStatus::Unverified, None)?;
        let tokens = self.persist_session(user_id, &pair).await?;

        // Delivery failures are logged, never surfaced; the caller can use
        // resend if the email never arrives.
        if let Err(err) = self.mailer.send_verify_email(email, &email_verify.token) {
            error!("failed to send verification email: {err}");
        }

        Ok(tokens)
    }

    /// Password login.
    ///
    /// # Errors
    ///
    /// `EmailOrPasswordIncorrect` for an unknown address or a wrong password;
    /// the two cases are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionTokens, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::EmailOrPasswordIncorrect)?;
        if !self.passwords.verify(&user.password_hash, password) {
            return Err(AuthError::EmailOrPasswordIncorrect);
        }

        let pair = self.issuer.issue_session_pair(user.id, user.verify, None)?;
        self.persist_session(user.id, &pair).await
    }

    /// Federated login through the configured OAuth provider.
    ///
    /// Existing accounts log in as-is; unknown addresses are registered with
    /// a random unguessable password (the account authenticates through the
    /// provider from then on).
    ///
    /// # Errors
    ///
    /// `GoogleEmailNotVerified` when the provider reports an unverified
    /// address; `Internal` for exchange or profile-fetch failures.
    pub async fn oauth_login(&self, code: &str) -> Result<FederatedLogin, AuthError> {
        let provider_tokens = self.identity.exchange_code(code).await?;
        let profile = self.identity.fetch_profile(&provider_tokens).await?;
        if !profile.verified_email {
            return Err(AuthError::GoogleEmailNotVerified);
        }

        if let Some(user) = self.users.find_by_email(&profile.email).await? {
            let pair = self.issuer.issue_session_pair(user.id, user.verify, None)?;
            let tokens = self.persist_session(user.id, &pair).await?;
            return Ok(FederatedLogin {
                tokens,
                new_user: false,
                verify: user.verify,
            });
        }

        let password = random_password()?;
        let tokens = self
            .register(&profile.name, &profile.email, &password)
            .await?;
        Ok(FederatedLogin {
            tokens,
            new_user: true,
            verify: VerifyStatus::Unverified,
        })
    }

    /// Rotate a refresh token into a new session pair.
    ///
    /// The presented token is consumed atomically; the replacement keeps the
    /// consumed token's absolute expiry, so rotation never extends the
    /// session. A token that fails the consume step was either already
    /// rotated (reuse, possibly an attacker replay) or never existed.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for signature/expiry failures;
    /// `UsedRefreshTokenOrNotExist` when no live record matches.
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        let payload = self.issuer.verify(refresh_token, TokenKind::RefreshToken)?;

        let consumed = self
            .refresh_tokens
            .consume_if_present(refresh_token)
            .await
            .context("failed to consume refresh token")?;
        let Some(record) = consumed else {
            return Err(AuthError::UsedRefreshTokenOrNotExist);
        };

        // If the insert below fails the old record stays consumed and the
        // user must log in again; accepted narrow window, not rolled back.
        let pair = self
            .issuer
            .issue_session_pair(record.user_id, payload.verify, Some(payload.exp))?;
        self.persist_session(record.user_id, &pair).await
    }

    /// Revoke a refresh token. Idempotent: revoking an unknown or already
    /// consumed token is a no-op.
    ///
    /// # Errors
    ///
    /// `Internal` for store failures.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens
            .consume_if_present(refresh_token)
            .await
            .context("failed to delete refresh token")?;
        Ok(())
    }

    /// Verify an access token and return its payload.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for malformed, forged, or expired tokens.
    pub fn authenticate(&self, access_token: &str) -> Result<TokenPayload, AuthError> {
        Ok(self.issuer.verify(access_token, TokenKind::AccessToken)?)
    }

    /// Consume an email-verify token: clear the stored field, advance the
    /// account to `Verified`, and start a fresh session.
    ///
    /// A token that was already consumed (stored field empty) degrades to the
    /// `AlreadyVerified` outcome instead of an error, so double-clicked links
    /// stay friendly.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when the subject is gone; `EmailVerifyTokenIsInvalid`
    /// when a newer token has replaced the presented one.
    pub async fn verify_email(&self, token: &str) -> Result<VerifyEmailOutcome, AuthError> {
        let payload = self.issuer.verify(token, TokenKind::EmailVerifyToken)?;
        let user = self
            .users
            .find_by_id(payload.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verify_token.is_empty() {
            return Ok(VerifyEmailOutcome::AlreadyVerified);
        }
        if user.email_verify_token != token {
            return Err(AuthError::EmailVerifyTokenIsInvalid);
        }

        self.users
            .update_fields(
                user.id,
                UserFields {
                    verify: Some(VerifyStatus::Verified),
                    email_verify_token: Some(String::new()),
                    ..UserFields::default()
                },
            )
            .await
            .context("failed to mark user verified")?;

        let pair = self
            .issuer
            .issue_session_pair(user.id, VerifyStatus::Verified, None)?;
        let tokens = self.persist_session(user.id, &pair).await?;
        Ok(VerifyEmailOutcome::Verified(tokens))
    }

    /// Issue a fresh email-verify token, overwriting (and thereby revoking)
    /// any previously issued one, and send it.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when the account is gone.
    pub async fn resend_verify_email(&self, user_id: Uuid) -> Result<ResendOutcome, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.verify == VerifyStatus::Verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let email_verify = self.issuer.issue_email_verify(user.id)?;
        self.users
            .update_fields(
                user.id,
                UserFields {
                    email_verify_token: Some(email_verify.token.clone()),
                    ..UserFields::default()
                },
            )
            .await
            .context("failed to store email verify token")?;

        if let Err(err) = self
            .mailer
            .send_verify_email(&user.email, &email_verify.token)
        {
            error!("failed to send verification email: {err}");
        }
        Ok(ResendOutcome::Sent)
    }

    /// Issue a forgot-password token, overwriting any previous one, and send
    /// the reset email.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when the address is unknown.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let forgot = self.issuer.issue_forgot_password(user.id, user.verify)?;
        self.users
            .update_fields(
                user.id,
                UserFields {
                    forgot_password_token: Some(forgot.token.clone()),
                    ..UserFields::default()
                },
            )
            .await
            .context("failed to store forgot password token")?;

        if let Err(err) = self
            .mailer
            .send_forgot_password_email(&user.email, &forgot.token)
        {
            error!("failed to send forgot password email: {err}");
        }
        Ok(())
    }

    /// Consume a forgot-password token and set the new password.
    ///
    /// # Errors
    ///
    /// `ForgotPasswordTokenIsInvalid` when the token no longer matches the
    /// stored field (superseded or already consumed); `UserNotFound` when the
    /// subject is gone.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError> {
        let payload = self.issuer.verify(token, TokenKind::ForgotPasswordToken)?;
        let user = self
            .users
            .find_by_id(payload.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.forgot_password_token.is_empty() || user.forgot_password_token != token {
            return Err(AuthError::ForgotPasswordTokenIsInvalid);
        }

        self.users
            .update_fields(
                user.id,
                UserFields {
                    password_hash: Some(self.passwords.hash(password)),
                    forgot_password_token: Some(String::new()),
                    ..UserFields::default()
                },
            )
            .await
            .context("failed to reset password")?;
        Ok(())
    }

    /// Change the password of an authenticated user.
    ///
    /// # Errors
    ///
    /// `PasswordIsIncorrect` when the old password does not match;
    /// `OldPasswordAndNewPasswordMustBeDifferent` when nothing would change.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !self.passwords.verify(&user.password_hash, old_password) {
            return Err(AuthError::PasswordIsIncorrect);
        }
        if self.passwords.verify(&user.password_hash, new_password) {
            return Err(AuthError::OldPasswordAndNewPasswordMustBeDifferent);
        }

        self.users
            .update_fields(
                user_id,
                UserFields {
                    password_hash: Some(self.passwords.hash(new_password)),
                    ..UserFields::default()
                },
            )
            .await
            .context("failed to change password")?;
        Ok(())
    }

    /// Profile of the authenticated user, sensitive fields projected out.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when the account is gone.
    pub async fn get_me(&self, user_id: Uuid) -> Result<Profile, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(Profile::from(user))
    }

    /// Public profile lookup by username.
    ///
    /// # Errors
    ///
    /// `UserNotFound` when no account has that username.
    pub async fn get_profile(&self, username: &str) -> Result<Profile, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(Profile::from(user))
    }
}

/// Random unguessable password for federated registrations. The raw value is
/// never shown to anyone.
fn random_password() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| anyhow!("failed to generate random password: {err}"))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::email::LogEmailSender;
    use crate::auth::issuer::TokenKeys;
    use crate::auth::oauth::UnconfiguredIdentityProvider;
    use crate::auth::store::{MemoryRefreshTokenStore, MemoryUserStore};
    use secrecy::SecretString;

    fn engine() -> (AuthEngine, Arc<MemoryUserStore>, Arc<MemoryRefreshTokenStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let refresh_tokens = Arc::new(MemoryRefreshTokenStore::new());
        let issuer = TokenIssuer::new(TokenKeys {
            access: SecretString::from("access-key"),
            refresh: SecretString::from("refresh-key"),
            email_verify: SecretString::from("email-verify-key"),
            forgot_password: SecretString::from("forgot-password-key"),
        });
        let engine = AuthEngine::new(
            users.clone(),
            refresh_tokens.clone(),
            issuer,
            PasswordHasher::new(SecretString::from("pepper")),
            Arc::new(LogEmailSender),
            Arc::new(UnconfiguredIdentityProvider),
        );
        (engine, users, refresh_tokens)
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() -> Result<(), AuthError> {
        let (engine, _, _) = engine();
        engine
            .register("Alice", "alice@example.com", "hunter2")
            .await?;
        let result = engine
            .register("Alice Again", "alice@example.com", "hunter2")
            .await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
        Ok(())
    }

    #[tokio::test]
    async fn login_hides_which_part_was_wrong() -> Result<(), AuthError> {
        let (engine, _, _) = engine();
        engine
            .register("Alice", "alice@example.com", "hunter2")
            .await?;

        let unknown = engine.login("bob@example.com", "hunter2").await;
        let wrong = engine.login("alice@example.com", "wrong").await;
        assert!(matches!(unknown, Err(AuthError::EmailOrPasswordIncorrect)));
        assert!(matches!(wrong, Err(AuthError::EmailOrPasswordIncorrect)));
        Ok(())
    }

    #[tokio::test]
    async fn logout_is_idempotent() -> Result<(), AuthError> {
        let (engine, _, refresh_tokens) = engine();
        let tokens = engine
            .register("Alice", "alice@example.com", "hunter2")
            .await?;

        engine.logout(&tokens.refresh_token).await?;
        assert!(!refresh_tokens.contains(&tokens.refresh_token).await);
        engine.logout(&tokens.refresh_token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn change_password_requires_a_different_password() -> Result<(), AuthError> {
        let (engine, users, _) = engine();
        engine
            .register("Alice", "alice@example.com", "hunter2")
            .await?;
        let user_id = users
            .find_by_email("alice@example.com")
            .await?
            .map(|user| user.id)
            .ok_or(AuthError::UserNotFound)?;

        let same = engine.change_password(user_id, "hunter2", "hunter2").await;
        assert!(matches!(
            same,
            Err(AuthError::OldPasswordAndNewPasswordMustBeDifferent)
        ));

        let wrong = engine.change_password(user_id, "nope", "hunter3").await;
        assert!(matches!(wrong, Err(AuthError::PasswordIsIncorrect)));

        engine.change_password(user_id, "hunter2", "hunter3").await?;
        engine.login("alice@example.com", "hunter3").await?;
        Ok(())
    }

    #[tokio::test]
    async fn profiles_are_looked_up_by_username() -> Result<(), AuthError> {
        let (engine, users, _) = engine();
        engine
            .register("Alice", "alice@example.com", "hunter2")
            .await?;
        let username = users
            .find_by_email("alice@example.com")
            .await?
            .map(|user| user.username)
            .ok_or(AuthError::UserNotFound)?;

        let profile = engine.get_profile(&username).await?;
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.verify, VerifyStatus::Unverified);

        let missing = engine.get_profile("user_nobody").await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
        Ok(())
    }
}
