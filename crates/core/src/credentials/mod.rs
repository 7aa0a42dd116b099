//! Short-lived cloud credentials and the sources that issue them.

mod provider;
mod sources;
pub mod sso;

pub use provider::{CredentialProvider, REFRESH_THRESHOLD};
pub use sources::{EnvironmentSource, ProfileSource};
pub use sso::{AwsCliBroker, RoleBroker, SsoSource};

use crate::error::CredentialError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which link of the precedence chain issued a set of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Profile,
    Environment,
    Sso,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Profile => "profile",
            SourceKind::Environment => "environment",
            SourceKind::Sso => "sso",
        };
        f.write_str(s)
    }
}

/// Role requested from the SSO broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub name: String,
    pub account_id: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, account_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            account_id,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account_id {
            Some(account) => write!(f, "{}@{}", self.name, account),
            None => f.write_str(&self.name),
        }
    }
}

/// One issued set of credentials. Never mutated after issue; a refresh
/// replaces the whole value.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub role: Role,
    pub source: SourceKind,
    pub issued_at: DateTime<Utc>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***REDACTED***")
            .field("session_token", &"***REDACTED***")
            .field("expires_at", &self.expires_at)
            .field("role", &self.role)
            .field("source", &self.source)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        source: SourceKind,
        role: Role,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            session_token: session_token.map(SecretString::from),
            expires_at: None,
            role,
            source,
            issued_at: Utc::now(),
        }
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn from_sdk(source: SourceKind, role: Role, creds: &aws_credential_types::Credentials) -> Self {
        Self::new(
            source,
            role,
            creds.access_key_id(),
            creds.secret_access_key(),
            creds.session_token().map(str::to_string),
        )
        .with_expiry(creds.expiry().map(DateTime::<Utc>::from))
    }

    /// Convert back into the SDK type for service clients.
    pub fn to_sdk(&self) -> aws_credential_types::Credentials {
        aws_credential_types::Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.expose_secret().to_string(),
            self.session_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            self.expires_at.map(std::time::SystemTime::from),
            "dmesh",
        )
    }

    /// Wall-clock time since issue. Clock skew backwards reads as zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.issued_at).to_std().unwrap_or_default()
    }

    pub fn is_stale(&self, threshold: Duration) -> bool {
        self.age() > threshold
    }
}

/// One link in the acquisition chain.
///
/// `Ok(None)` means the source has nothing to offer and the chain should
/// move on; an `Err` carries a failure the operator needs to see.
#[async_trait]
pub trait CredentialSource: Send + Sync + fmt::Debug {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new(
            SourceKind::Environment,
            Role::new("Analyst", None),
            "AKIAEXAMPLE",
            "super-secret",
            Some("token-value".into()),
        );
        let printed = format!("{:?}", creds);
        assert!(printed.contains("AKIAEXAMPLE"));
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("token-value"));
    }

    #[test]
    fn test_staleness_uses_issue_time() {
        let mut creds = Credentials::new(
            SourceKind::Sso,
            Role::new("Analyst", Some("123456789012".into())),
            "AKIA",
            "secret",
            None,
        );
        assert!(!creds.is_stale(REFRESH_THRESHOLD));

        creds.issued_at = Utc::now() - chrono::Duration::minutes(56);
        assert!(creds.is_stale(REFRESH_THRESHOLD));
    }

    #[test]
    fn test_sdk_round_trip_keeps_token() {
        let creds = Credentials::new(
            SourceKind::Profile,
            Role::new("Analyst", None),
            "AKIA",
            "secret",
            Some("tok".into()),
        );
        let sdk = creds.to_sdk();
        assert_eq!(sdk.access_key_id(), "AKIA");
        assert_eq!(sdk.session_token(), Some("tok"));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(
            Role::new("DataAnalyst", Some("123456789012".into())).to_string(),
            "DataAnalyst@123456789012"
        );
        assert_eq!(Role::new("DataAnalyst", None).to_string(), "DataAnalyst");
    }
}
