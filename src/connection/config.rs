use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// URL scheme that selects the in-process store instead of the hosted one.
pub const MEMORY_SCHEME: &str = "memory";

/// How the token is presented to the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Legacy database secret or ID token, sent as `auth=`.
    #[default]
    DatabaseSecret,
    /// OAuth2 access token, sent as `access_token=`.
    AccessToken,
}

impl TokenKind {
    pub fn query_param(&self) -> &'static str {
        match self {
            TokenKind::DatabaseSecret => "auth",
            TokenKind::AccessToken => "access_token",
        }
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secret" | "database-secret" | "auth" => Ok(TokenKind::DatabaseSecret),
            "access-token" | "oauth" | "access_token" => Ok(TokenKind::AccessToken),
            other => Err(format!(
                "unknown token kind '{other}' (expected 'secret' or 'access-token')"
            )),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::DatabaseSecret => f.write_str("secret"),
            TokenKind::AccessToken => f.write_str("access-token"),
        }
    }
}

/// Store connection configuration
///
/// Credentials and endpoint are bootstrap data: they come from command-line
/// flags, the environment, or a credentials file, and the maintenance
/// procedures never see them.
#[derive(Clone)]
pub struct StoreConfig {
    /// Root URL of the database, e.g. `https://league-default-rtdb.firebaseio.com`
    pub database_url: String,

    /// Secret or access token, if the database requires one
    pub token: Option<String>,

    pub token_kind: TokenKind,

    /// Per-request timeout
    pub timeout: Duration,
}

/// On-disk credentials: either a small hand-written file or a service
/// account key. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "databaseURL", alias = "databaseUrl", alias = "database_url")]
    database_url: Option<String>,
    project_id: Option<String>,
    #[serde(rename = "databaseSecret", alias = "database_secret")]
    database_secret: Option<String>,
    #[serde(rename = "accessToken", alias = "access_token")]
    access_token: Option<String>,
}

impl StoreConfig {
    /// Create a new configuration for `database_url`
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: database_url.trim().to_string(),
            token: None,
            token_kind: TokenKind::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the token
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn token_kind(mut self, kind: TokenKind) -> Self {
        self.token_kind = kind;
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from a JSON credentials file
    ///
    /// Recognised fields: `databaseURL`, `project_id` (used to derive the
    /// default database URL when `databaseURL` is missing), and one of
    /// `databaseSecret` / `accessToken`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = StoreConfig::from_credentials_file("league-admin.json")?;
    /// ```
    pub fn from_credentials_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read credentials file '{}': {e}", path.display()))?;
        Self::from_credentials_json(&raw)
            .map_err(|e| format!("credentials file '{}': {e}", path.display()))
    }

    fn from_credentials_json(raw: &str) -> Result<Self, String> {
        let file: CredentialsFile =
            serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;

        let database_url = match (file.database_url, file.project_id) {
            (Some(url), _) => url,
            (None, Some(project)) => format!("https://{project}-default-rtdb.firebaseio.com"),
            (None, None) => return Err("neither databaseURL nor project_id is set".to_string()),
        };

        let config = Self::new(&database_url);
        match (file.database_secret, file.access_token) {
            (Some(_), Some(_)) => {
                Err("set only one of databaseSecret and accessToken".to_string())
            }
            (Some(secret), None) => Ok(config.token(&secret)),
            (None, Some(token)) => Ok(config.token(&token).token_kind(TokenKind::AccessToken)),
            (None, None) => Ok(config),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.database_url
            .split_once("://")
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(MEMORY_SCHEME))
    }

    /// Database URL with credentials and query string stripped, for logs.
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.database_url) {
            Ok(mut url) => {
                if !url.username().is_empty() {
                    let _ = url.set_username("***");
                }
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.set_query(None);
                url.to_string()
            }
            Err(_) => self
                .database_url
                .split('?')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("database URL is not set".to_string());
        }

        if !self.is_memory() {
            let url = Url::parse(&self.database_url)
                .map_err(|e| format!("invalid database URL '{}': {e}", self.redacted_url()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "unsupported scheme '{}' (expected https, http or {MEMORY_SCHEME})",
                    url.scheme()
                ));
            }
        }

        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("token cannot be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("timeout must be > 0".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &self.redacted_url())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("token_kind", &self.token_kind)
            .field("timeout", &self.timeout)
            .finish()
    }
}
