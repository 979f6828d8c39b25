use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("google-client-id")
                .long("google-client-id")
                .help("Google OAuth client id")
                .env("AVIARY_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new("google-client-secret")
                .long("google-client-secret")
                .help("Google OAuth client secret")
                .env("AVIARY_GOOGLE_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("google-redirect-uri")
                .long("google-redirect-uri")
                .help("Redirect URI registered with the Google OAuth client")
                .env("AVIARY_GOOGLE_REDIRECT_URI"),
        )
}

/// Google OAuth credentials; federation stays disabled unless all three are
/// present.
#[derive(Debug)]
pub struct Options {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: Option<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            client_id: matches.get_one::<String>("google-client-id").cloned(),
            client_secret: matches
                .get_one::<String>("google-client-secret")
                .cloned()
                .map(SecretString::from),
            redirect_uri: matches.get_one::<String>("google-redirect-uri").cloned(),
        }
    }

    /// All three credentials, when fully configured.
    #[must_use]
    pub fn into_credentials(self) -> Option<(String, SecretString, String)> {
        match (self.client_id, self.client_secret, self.redirect_uri) {
            (Some(id), Some(secret), Some(uri)) => Some((id, secret, uri)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: Vec<&str>) -> anyhow::Result<ArgMatches> {
        let mut full = vec![
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
        ];
        full.extend(args);
        Ok(crate::cli::commands::new().try_get_matches_from(full)?)
    }

    #[test]
    fn partial_credentials_disable_federation() -> anyhow::Result<()> {
        temp_env::with_vars_unset(
            ["AVIARY_GOOGLE_CLIENT_SECRET", "AVIARY_GOOGLE_REDIRECT_URI"],
            || {
                let matches = matches(vec!["--google-client-id", "id"])?;
                let options = Options::parse(&matches);
                assert!(options.into_credentials().is_none());
                Ok(())
            },
        )
    }

    #[test]
    fn full_credentials_enable_federation() -> anyhow::Result<()> {
        let matches = matches(vec![
            "--google-client-id",
            "id",
            "--google-client-secret",
            "secret",
            "--google-redirect-uri",
            "http://localhost:3000/oauth",
        ])?;
        let options = Options::parse(&matches);
        let (id, _, uri) = options
            .into_credentials()
            .ok_or_else(|| anyhow::anyhow!("expected credentials"))?;
        assert_eq!(id, "id");
        assert_eq!(uri, "http://localhost:3000/oauth");
        Ok(())
    }
}
