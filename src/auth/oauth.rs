//! Google identity federation.
//!
//! Exchanges an OAuth authorization code for provider tokens and fetches the
//! provider profile; the engine then treats the result like a password login.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

/// Tokens returned by the provider's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub id_token: String,
}

/// Profile fields the engine needs from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    pub email: String,
    pub verified_email: bool,
    pub name: String,
}

/// Third-party identity provider contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for provider tokens.
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens>;

    /// Fetch the profile for previously exchanged tokens.
    async fn fetch_profile(&self, tokens: &ProviderTokens) -> Result<ProviderProfile>;
}

/// Google OAuth client using the `authorization_code` grant.
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl GoogleOAuthClient {
    /// Build the client with the application's web user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        client_id: String,
        client_secret: SecretString,
        redirect_uri: String,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build OAuth HTTP client")?;
        Ok(Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens> {
        let form = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&form)
            .send()
            .await
            .context("google token exchange request failed")?;
        let response = response
            .error_for_status()
            .context("google token exchange rejected")?;
        response
            .json::<ProviderTokens>()
            .await
            .context("invalid google token exchange response")
    }

    async fn fetch_profile(&self, tokens: &ProviderTokens) -> Result<ProviderProfile> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .query(&[
                ("access_token", tokens.access_token.as_str()),
                ("alt", "json"),
            ])
            .bearer_auth(&tokens.id_token)
            .send()
            .await
            .context("google userinfo request failed")?;
        let response = response
            .error_for_status()
            .context("google userinfo rejected")?;
        response
            .json::<ProviderProfile>()
            .await
            .context("invalid google userinfo response")
    }
}

/// Placeholder provider wired when Google credentials are not configured.
pub struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn exchange_code(&self, _code: &str) -> Result<ProviderTokens> {
        bail!("google oauth is not configured")
    }

    async fn fetch_profile(&self, _tokens: &ProviderTokens) -> Result<ProviderProfile> {
        bail!("google oauth is not configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_profile_deserializes_google_shape() -> Result<()> {
        let json = r#"{
            "id": "103",
            "email": "alice@example.com",
            "verified_email": true,
            "name": "Alice Example",
            "given_name": "Alice",
            "picture": "https://example.com/p.png"
        }"#;
        let profile: ProviderProfile = serde_json::from_str(json)?;
        assert_eq!(profile.email, "alice@example.com");
        assert!(profile.verified_email);
        assert_eq!(profile.name, "Alice Example");
        Ok(())
    }

    #[test]
    fn provider_tokens_deserialize_exchange_shape() -> Result<()> {
        let json = r#"{
            "access_token": "ya29.a0",
            "expires_in": 3599,
            "id_token": "eyJh",
            "scope": "openid",
            "token_type": "Bearer"
        }"#;
        let tokens: ProviderTokens = serde_json::from_str(json)?;
        assert_eq!(tokens.access_token, "ya29.a0");
        assert_eq!(tokens.id_token, "eyJh");
        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_provider_always_fails() {
        let provider = UnconfiguredIdentityProvider;
        assert!(provider.exchange_code("code").await.is_err());
    }
}
