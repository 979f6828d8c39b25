use crate::{
    api,
    auth::{
        email::LogEmailSender,
        issuer::{TokenIssuer, TokenKeys},
        oauth::{GoogleOAuthClient, IdentityProvider, UnconfiguredIdentityProvider},
        password::PasswordHasher,
    },
    cli::commands::{auth, oauth},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_url: Option<String>,
    pub auth: auth::Options,
    pub google: oauth::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let issuer = TokenIssuer::new(TokenKeys {
        access: args.auth.access_token_key,
        refresh: args.auth.refresh_token_key,
        email_verify: args.auth.email_verify_token_key,
        forgot_password: args.auth.forgot_password_token_key,
    })
    .with_access_ttl_seconds(args.auth.access_token_ttl_seconds)
    .with_refresh_ttl_seconds(args.auth.refresh_token_ttl_seconds)
    .with_email_verify_ttl_seconds(args.auth.email_verify_token_ttl_seconds)
    .with_forgot_password_ttl_seconds(args.auth.forgot_password_token_ttl_seconds);

    let passwords = PasswordHasher::new(args.auth.password_pepper);

    let identity: Arc<dyn IdentityProvider> = match args.google.into_credentials() {
        Some((client_id, client_secret, redirect_uri)) => {
            info!("Google OAuth federation enabled");
            Arc::new(GoogleOAuthClient::new(
                client_id,
                client_secret,
                redirect_uri,
            )?)
        }
        None => Arc::new(UnconfiguredIdentityProvider),
    };

    api::new(
        args.port,
        args.dsn,
        args.frontend_url,
        issuer,
        passwords,
        Arc::new(LogEmailSender),
        identity,
    )
    .await
}
