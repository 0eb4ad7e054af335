//! OAuth2 access tokens for Google Cloud Storage
//!
//! Two credential strategies are supported behind one configuration switch:
//! the ambient identity of the machine (instance metadata server) and an
//! explicit credentials file, typically named by
//! `GOOGLE_APPLICATION_CREDENTIALS`. Tokens are cached until shortly before
//! they expire.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use railsight_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Environment variable naming a credentials file
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Environment variable overriding the metadata server host
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const STORAGE_READ_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on the advertised `expires_in` of any token
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// How credentials are acquired
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CredentialsConfig {
    /// Credentials file from `GOOGLE_APPLICATION_CREDENTIALS` if set,
    /// otherwise the metadata server
    #[default]
    Auto,

    /// Ambient platform identity from the instance metadata server
    Metadata,

    /// Explicit credentials file
    File { path: PathBuf },

    /// No credentials (public buckets, emulators)
    Anonymous,
}

/// Contents of a credentials file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

enum Strategy {
    Anonymous,
    Metadata {
        host: String,
    },
    ServiceAccount {
        client_email: String,
        key: EncodingKey,
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Metadata { .. } => "metadata",
            Self::ServiceAccount { .. } => "service_account",
            Self::AuthorizedUser { .. } => "authorized_user",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Supplies bearer tokens for storage requests
pub struct TokenProvider {
    strategy: Strategy,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Resolve a provider from configuration
    pub fn from_config(config: &CredentialsConfig, client: reqwest::Client) -> Result<Self> {
        let strategy = match config {
            CredentialsConfig::Auto => match std::env::var_os(CREDENTIALS_ENV) {
                Some(path) => Self::strategy_from_file(Path::new(&path))?,
                None => Self::metadata_strategy(),
            },
            CredentialsConfig::Metadata => Self::metadata_strategy(),
            CredentialsConfig::File { path } => Self::strategy_from_file(path)?,
            CredentialsConfig::Anonymous => Strategy::Anonymous,
        };

        info!("Using {} credentials for storage access", strategy.name());
        Ok(Self::with_strategy(strategy, client))
    }

    /// Provider that never sends credentials
    pub fn anonymous(client: reqwest::Client) -> Self {
        Self::with_strategy(Strategy::Anonymous, client)
    }

    /// Provider backed by a metadata server at `host` (`host[:port]`)
    pub fn metadata(host: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_strategy(Strategy::Metadata { host: host.into() }, client)
    }

    /// Provider backed by a parsed credentials file
    pub fn from_credentials_json(json: &str, client: reqwest::Client) -> Result<Self> {
        Ok(Self::with_strategy(Self::strategy_from_json(json)?, client))
    }

    fn with_strategy(strategy: Strategy, client: reqwest::Client) -> Self {
        Self {
            strategy,
            client,
            cached: Mutex::new(None),
        }
    }

    fn metadata_strategy() -> Strategy {
        let host = std::env::var(METADATA_HOST_ENV)
            .unwrap_or_else(|_| DEFAULT_METADATA_HOST.to_string());
        Strategy::Metadata { host }
    }

    fn strategy_from_file(path: &Path) -> Result<Strategy> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::credentials(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::strategy_from_json(&json)
    }

    fn strategy_from_json(json: &str) -> Result<Strategy> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| Error::credentials(format!("Invalid credentials file: {}", e)))?;

        match file {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => {
                let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
                    Error::credentials(format!("Invalid service account private key: {}", e))
                })?;
                Ok(Strategy::ServiceAccount {
                    client_email,
                    key,
                    token_uri,
                })
            }
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => Ok(Strategy::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            }),
        }
    }

    /// Name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Current access token, or `None` for anonymous access
    pub async fn token(&self) -> Result<Option<String>> {
        if matches!(self.strategy, Strategy::Anonymous) {
            return Ok(None);
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(Some(token.value.clone()));
        }

        debug!("Requesting new {} access token", self.strategy.name());
        let response = self.request_token().await?;
        let value = response.access_token.clone();
        *cached = Some(CachedToken {
            value: response.access_token,
            expires_at: Instant::now() + token_lifetime(response.expires_in),
        });

        Ok(Some(value))
    }

    async fn request_token(&self) -> Result<TokenResponse> {
        let request = match &self.strategy {
            Strategy::Anonymous => {
                return Err(Error::internal("anonymous access has no token"));
            }
            Strategy::Metadata { host } => self
                .client
                .get(format!(
                    "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host
                ))
                .header("Metadata-Flavor", "Google"),
            Strategy::ServiceAccount {
                client_email,
                key,
                token_uri,
            } => {
                let assertion = sign_assertion(client_email, key, token_uri)?;
                self.client.post(token_uri).form(&[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                    ("assertion", assertion.as_str()),
                ])
            }
            Strategy::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => self.client.post(token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ]),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::credentials(format!("Token request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::credentials(format!(
                "Token endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::credentials(format!("Malformed token response: {}", e)))
    }
}

fn token_lifetime(expires_in: u64) -> Duration {
    Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME)
}

fn sign_assertion(client_email: &str, key: &EncodingKey, token_uri: &str) -> Result<String> {
    let iat = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        iss: client_email,
        scope: STORAGE_READ_SCOPE,
        aud: token_uri,
        iat,
        exp: iat + 3600,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| Error::credentials(format!("Failed to sign JWT assertion: {}", e)))
}
