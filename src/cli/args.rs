use clap::{Args, Parser, Subcommand};
use fantasy_admin::{StoreConfig, TokenKind};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "fantasy-admin")]
#[command(about = "Maintenance tooling for the fantasy-football realtime database")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Read everything but send no writes; report what would change
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Maximum manager writes in flight
    #[arg(long, global = true, default_value_t = 1)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Root URL of the database (`memory://` for a throwaway in-process store)
    #[arg(long, env = "FANTASY_DB_URL", global = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "FANTASY_DB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// How the token is sent: `secret` or `access-token`
    #[arg(long, env = "FANTASY_DB_TOKEN_KIND", global = true)]
    pub token_kind: Option<TokenKind>,

    /// JSON credentials file; explicit flags take precedence over it
    #[arg(long, env = "FANTASY_DB_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete all loans and matches and zero every manager's counters
    Cleanup,
    /// Raise every manager's budget to at least the target
    MigrateBudgets {
        /// Budget floor, e.g. 900000000 or 900_000_000
        #[arg(long, value_parser = parse_amount)]
        target: i64,
    },
}

impl StoreArgs {
    /// Layer flags and environment over the credentials file.
    pub fn to_config(&self) -> Result<StoreConfig, String> {
        let mut config = match &self.credentials {
            Some(path) => StoreConfig::from_credentials_file(path)?,
            None => StoreConfig::new(""),
        };

        if let Some(url) = &self.database_url {
            config.database_url = url.trim().to_string();
        }
        if let Some(token) = &self.token {
            config = config.token(token);
        }
        if let Some(kind) = self.token_kind {
            config = config.token_kind(kind);
        }
        config = config.timeout(Duration::from_secs(self.timeout_secs));

        config.validate()?;
        Ok(config)
    }
}

/// Parse a non-negative currency amount, allowing `_` and `,` as digit separators.
pub fn parse_amount(raw: &str) -> Result<i64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ',')
        .collect();
    let amount: i64 = cleaned
        .parse()
        .map_err(|_| format!("'{raw}' is not a whole number"))?;
    if amount < 0 {
        return Err(format!("amount must not be negative, got {amount}"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("900000000"), Ok(900_000_000));
        assert_eq!(parse_amount("900_000_000"), Ok(900_000_000));
        assert_eq!(parse_amount("900,000,000"), Ok(900_000_000));
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("9e8").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_migrate_budgets_args() {
        let cli = Cli::try_parse_from([
            "fantasy-admin",
            "--database-url",
            "memory://",
            "migrate-budgets",
            "--target",
            "900_000_000",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.dry_run);
        match cli.command {
            Command::MigrateBudgets { target } => assert_eq!(target, 900_000_000),
            Command::Cleanup => panic!("expected migrate-budgets"),
        }
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["fantasy-admin", "migrate-budgets"]).is_err());
    }

    #[test]
    fn test_flags_override_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"databaseURL": "https://from-file.example.com", "databaseSecret": "file-secret"}"#,
        )
        .unwrap();

        let args = StoreArgs {
            database_url: Some("https://from-flag.example.com".into()),
            token: None,
            token_kind: None,
            credentials: Some(file.path().to_path_buf()),
            timeout_secs: 5,
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.database_url, "https://from-flag.example.com");
        assert_eq!(config.token.as_deref(), Some("file-secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let args = StoreArgs {
            database_url: None,
            token: None,
            token_kind: None,
            credentials: None,
            timeout_secs: 30,
        };
        assert!(args.to_config().is_err());
    }
}
