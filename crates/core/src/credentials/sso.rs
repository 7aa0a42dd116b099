//! SSO token cache lookup and role credential exchange.
//!
//! An external login flow (`aws sso login`) leaves JSON token files in the
//! cache directory. The newest one is checked for expiry and, if still
//! valid, a broker exchanges it for temporary role credentials.

use super::{CredentialSource, Credentials, Role, SourceKind};
use crate::error::CredentialError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedToken {
    expires_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrokerResponse {
    role_credentials: RoleCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    /// Epoch milliseconds.
    #[serde(default)]
    expiration: Option<i64>,
}

/// Most recently modified `*.json` file in `dir`, or `None` if the
/// directory is missing or holds no token files.
pub async fn newest_token_file(dir: &Path) -> Result<Option<PathBuf>, CredentialError> {
    let cache_error = |e: std::io::Error| CredentialError::TokenCache {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(cache_error(e)),
    };

    let mut newest: Option<(PathBuf, SystemTime)> = None;
    while let Some(entry) = entries.next_entry().await.map_err(cache_error)? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let metadata = entry.metadata().await.map_err(cache_error)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().map_err(cache_error)?;
        if newest.as_ref().map_or(true, |(_, t)| modified > *t) {
            newest = Some((path, modified));
        }
    }

    Ok(newest.map(|(path, _)| path))
}

/// `expiresAt` of a cached token file.
pub async fn token_expiry(path: &Path) -> Result<DateTime<Utc>, CredentialError> {
    let cache_error = |message: String| CredentialError::TokenCache {
        path: path.to_path_buf(),
        message,
    };

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| cache_error(e.to_string()))?;
    let token: CachedToken =
        serde_json::from_slice(&data).map_err(|e| cache_error(e.to_string()))?;

    DateTime::parse_from_rfc3339(&token.expires_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| cache_error(format!("invalid expiresAt '{}': {}", token.expires_at, e)))
}

/// Exchanges a valid SSO session for temporary credentials of one role.
#[async_trait]
pub trait RoleBroker: Send + Sync + fmt::Debug {
    async fn role_credentials(&self, role: &Role) -> Result<Credentials, CredentialError>;
}

/// Shells out to `aws sso get-role-credentials`.
#[derive(Debug, Clone)]
pub struct AwsCliBroker {
    program: String,
    profile: Option<String>,
}

impl AwsCliBroker {
    pub fn new(program: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            program: program.into(),
            profile,
        }
    }
}

#[async_trait]
impl RoleBroker for AwsCliBroker {
    async fn role_credentials(&self, role: &Role) -> Result<Credentials, CredentialError> {
        if role.name.is_empty() {
            return Err(CredentialError::BrokerFailure {
                message: "no role configured (set default_role or assume one)".to_string(),
            });
        }
        let account_id = role
            .account_id
            .as_deref()
            .ok_or_else(|| CredentialError::BrokerFailure {
                message: format!("no account id configured for role '{}'", role.name),
            })?;

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(["sso", "get-role-credentials", "--output", "json"]);
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile]);
        }
        cmd.args(["--role-name", &role.name, "--account-id", account_id]);

        tracing::debug!(program = %self.program, role = %role, "Requesting role credentials");
        let output = cmd.output().await.map_err(|e| CredentialError::BrokerFailure {
            message: format!("failed to run '{}': {}", self.program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CredentialError::BrokerFailure {
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        parse_broker_output(&output.stdout, role)
    }
}

/// Parse `{roleCredentials: {...}}` into SSO-sourced credentials.
pub fn parse_broker_output(stdout: &[u8], role: &Role) -> Result<Credentials, CredentialError> {
    let response: BrokerResponse =
        serde_json::from_slice(stdout).map_err(|e| CredentialError::BrokerFailure {
            message: format!("unparseable broker response: {}", e),
        })?;
    let rc = response.role_credentials;

    let expires_at = rc.expiration.and_then(DateTime::<Utc>::from_timestamp_millis);
    Ok(Credentials::new(
        SourceKind::Sso,
        role.clone(),
        rc.access_key_id,
        rc.secret_access_key,
        Some(rc.session_token),
    )
    .with_expiry(expires_at))
}

/// Last link of the chain: cached SSO token plus broker exchange.
#[derive(Debug)]
pub struct SsoSource {
    cache_dir: Option<PathBuf>,
    broker: Arc<dyn RoleBroker>,
}

impl SsoSource {
    pub fn new(cache_dir: Option<PathBuf>, broker: Arc<dyn RoleBroker>) -> Self {
        Self { cache_dir, broker }
    }
}

#[async_trait]
impl CredentialSource for SsoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Sso
    }

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError> {
        let Some(dir) = self.cache_dir.as_deref() else {
            return Ok(None);
        };
        let Some(token_path) = newest_token_file(dir).await? else {
            tracing::debug!(dir = %dir.display(), "No SSO token in cache");
            return Ok(None);
        };

        let expires_at = token_expiry(&token_path).await?;
        if Utc::now() > expires_at {
            return Err(CredentialError::TokenExpired {
                expired_at: expires_at,
            });
        }

        self.broker.role_credentials(role).await.map(Some)
    }
}
