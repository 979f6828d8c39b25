use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub fn with_args(command: Command) -> Command {
    let command = with_key_args(command);
    with_ttl_args(command)
}

fn with_key_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-key")
                .long("access-token-key")
                .help("HMAC key for signing access tokens")
                .env("AVIARY_ACCESS_TOKEN_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("refresh-token-key")
                .long("refresh-token-key")
                .help("HMAC key for signing refresh tokens")
                .env("AVIARY_REFRESH_TOKEN_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("email-verify-token-key")
                .long("email-verify-token-key")
                .help("HMAC key for signing email verification tokens")
                .env("AVIARY_EMAIL_VERIFY_TOKEN_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("forgot-password-token-key")
                .long("forgot-password-token-key")
                .help("HMAC key for signing forgot password tokens")
                .env("AVIARY_FORGOT_PASSWORD_TOKEN_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("password-pepper")
                .long("password-pepper")
                .help("Server-side secret mixed into password hashes")
                .env("AVIARY_PASSWORD_PEPPER")
                .hide_env_values(true)
                .required(true),
        )
}

fn with_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("AVIARY_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-seconds")
                .long("refresh-token-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("AVIARY_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("8640000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("email-verify-token-ttl-seconds")
                .long("email-verify-token-ttl-seconds")
                .help("Email verification token TTL in seconds")
                .env("AVIARY_EMAIL_VERIFY_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("forgot-password-token-ttl-seconds")
                .long("forgot-password-token-ttl-seconds")
                .help("Forgot password token TTL in seconds")
                .env("AVIARY_FORGOT_PASSWORD_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub access_token_key: SecretString,
    pub refresh_token_key: SecretString,
    pub email_verify_token_key: SecretString,
    pub forgot_password_token_key: SecretString,
    pub password_pepper: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub email_verify_token_ttl_seconds: i64,
    pub forgot_password_token_ttl_seconds: i64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = |name: &str| -> Result<SecretString> {
            matches
                .get_one::<String>(name)
                .cloned()
                .map(SecretString::from)
                .with_context(|| format!("missing required argument: --{name}"))
        };
        let ttl = |name: &str, default: i64| -> i64 {
            matches.get_one::<i64>(name).copied().unwrap_or(default)
        };

        Ok(Self {
            access_token_key: secret("access-token-key")?,
            refresh_token_key: secret("refresh-token-key")?,
            email_verify_token_key: secret("email-verify-token-key")?,
            forgot_password_token_key: secret("forgot-password-token-key")?,
            password_pepper: secret("password-pepper")?,
            access_token_ttl_seconds: ttl("access-token-ttl-seconds", 900),
            refresh_token_ttl_seconds: ttl("refresh-token-ttl-seconds", 8_640_000),
            email_verify_token_ttl_seconds: ttl("email-verify-token-ttl-seconds", 604_800),
            forgot_password_token_ttl_seconds: ttl("forgot-password-token-ttl-seconds", 604_800),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn options_parse_defaults() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.try_get_matches_from(vec![
            "aviary",
            "--dsn",
            "postgres://localhost/aviary",
            "--access-token-key",
            "a",
            "--refresh-token-key",
            "r",
            "--email-verify-token-key",
            "e",
            "--forgot-password-token-key",
            "f",
            "--password-pepper",
            "pepper",
        ])?;

        let options = Options::parse(&matches)?;
        assert_eq!(options.access_token_key.expose_secret(), "a");
        assert_eq!(options.password_pepper.expose_secret(), "pepper");
        assert_eq!(options.access_token_ttl_seconds, 900);
        assert_eq!(options.refresh_token_ttl_seconds, 8_640_000);
        assert_eq!(options.email_verify_token_ttl_seconds, 604_800);
        assert_eq!(options.forgot_password_token_ttl_seconds, 604_800);
        Ok(())
    }

    #[test]
    fn ttl_overrides_are_honored() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.try_get_matches_from(vec![
            "aviary",
            "--dsn",
            "postgres://localhost/aviary",
            "--access-token-key",
            "a",
            "--refresh-token-key",
            "r",
            "--email-verify-token-key",
            "e",
            "--forgot-password-token-key",
            "f",
            "--password-pepper",
            "pepper",
            "--access-token-ttl-seconds",
            "60",
        ])?;

        let options = Options::parse(&matches)?;
        assert_eq!(options.access_token_ttl_seconds, 60);
        Ok(())
    }
}
