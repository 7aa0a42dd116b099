use super::sources::{EnvironmentSource, ProfileSource};
use super::sso::{AwsCliBroker, SsoSource};
use super::{CredentialSource, Credentials, Role, SourceKind};
use crate::error::CredentialError;
use dmesh_common::config::MeshConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cached credentials older than this are re-issued before being handed out.
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(55 * 60);

#[derive(Debug)]
struct ProviderState {
    role: Role,
    cached: Option<Arc<Credentials>>,
}

/// Owns the active role and its cached credentials.
///
/// Role and cache sit behind one lock, so a reader never observes a role
/// paired with credentials issued for another.
#[derive(Debug)]
pub struct CredentialProvider {
    state: RwLock<ProviderState>,
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl CredentialProvider {
    /// `sources` are tried in the order given.
    pub fn new(role: Role, sources: Vec<Arc<dyn CredentialSource>>) -> Self {
        Self {
            state: RwLock::new(ProviderState { role, cached: None }),
            sources,
        }
    }

    /// Profile (when configured), then environment, then the SSO cache exchange.
    pub fn from_config(config: &MeshConfig) -> Self {
        let role = Role::new(
            config.default_role.clone().unwrap_or_default(),
            config.aws_account_id.clone(),
        );

        let mut sources: Vec<Arc<dyn CredentialSource>> = Vec::with_capacity(3);
        if let Some(profile) = &config.aws_profile {
            sources.push(Arc::new(ProfileSource::new(profile.clone())));
        }
        sources.push(Arc::new(EnvironmentSource::new()));

        let broker = AwsCliBroker::new(
            config.credentials.broker_program.clone(),
            config.aws_profile.clone(),
        );
        sources.push(Arc::new(SsoSource::new(
            config.credentials.resolve_sso_cache_dir(),
            Arc::new(broker),
        )));

        Self::new(role, sources)
    }

    pub async fn role(&self) -> Role {
        self.state.read().await.role.clone()
    }

    /// Run the full precedence chain for the active role and cache the result.
    pub async fn acquire(&self) -> Result<Arc<Credentials>, CredentialError> {
        let mut state = self.state.write().await;
        let creds = Arc::new(self.run_chain(&state.role).await?);
        state.cached = Some(creds.clone());
        Ok(creds)
    }

    /// Cached credentials, acquiring on first use and re-issuing once stale.
    pub async fn current(&self) -> Result<Arc<Credentials>, CredentialError> {
        // Fast path: fresh cache under the read lock
        {
            let state = self.state.read().await;
            if let Some(creds) = state.cached.as_ref() {
                if !creds.is_stale(REFRESH_THRESHOLD) {
                    return Ok(creds.clone());
                }
            }
        }

        let mut state = self.state.write().await;

        // Double-check: another task may have refreshed while we waited
        let creds = match state.cached.as_ref() {
            Some(creds) if !creds.is_stale(REFRESH_THRESHOLD) => {
                tracing::debug!("Credentials refreshed by another task");
                return Ok(creds.clone());
            }
            Some(stale) => {
                tracing::info!(
                    source = %stale.source,
                    role = %state.role,
                    age_secs = stale.age().as_secs(),
                    "Refreshing stale credentials"
                );
                self.refresh_from(stale.source, &state.role).await?
            }
            None => {
                tracing::debug!(role = %state.role, "No cached credentials, acquiring");
                self.run_chain(&state.role).await?
            }
        };

        let creds = Arc::new(creds);
        state.cached = Some(creds.clone());
        Ok(creds)
    }

    /// Switch to `role` via the SSO exchange. On failure the previous role
    /// and credentials stay in place.
    pub async fn assume_role(&self, role: Role) -> Result<Arc<Credentials>, CredentialError> {
        let mut state = self.state.write().await;

        match self.refresh_from(SourceKind::Sso, &role).await {
            Ok(creds) => {
                tracing::info!(from = %state.role, to = %role, "Assumed role");
                let creds = Arc::new(creds);
                state.role = role;
                state.cached = Some(creds.clone());
                Ok(creds)
            }
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "Assume role failed, keeping previous role");
                Err(CredentialError::AssumeRoleFailed {
                    role: role.name,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn run_chain(&self, role: &Role) -> Result<Credentials, CredentialError> {
        for source in &self.sources {
            match source.fetch(role).await {
                Ok(Some(creds)) => {
                    tracing::debug!(source = %source.kind(), "Credentials acquired");
                    return Ok(creds);
                }
                Ok(None) => {
                    tracing::debug!(source = %source.kind(), "Credential source unavailable");
                }
                // Profile and environment lookups are opportunistic; only the
                // SSO exchange reports errors the operator must act on.
                Err(e) if source.kind() != SourceKind::Sso => {
                    tracing::debug!(source = %source.kind(), error = %e, "Credential source failed");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CredentialError::NoSource)
    }

    async fn refresh_from(&self, kind: SourceKind, role: &Role) -> Result<Credentials, CredentialError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.kind() == kind)
            .ok_or(CredentialError::NoSource)?;

        source.fetch(role).await?.ok_or(CredentialError::NoSource)
    }
}
