use super::{CredentialSource, Credentials, Role, SourceKind};
use crate::error::CredentialError;
use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::ProvideCredentials;

/// Static or chained credentials from a named shared-config profile.
#[derive(Debug)]
pub struct ProfileSource {
    profile: String,
}

impl ProfileSource {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for ProfileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Profile
    }

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError> {
        let provider = ProfileFileCredentialsProvider::builder()
            .profile_name(&self.profile)
            .build();

        match provider.provide_credentials().await {
            Ok(creds) => Ok(Some(Credentials::from_sdk(
                SourceKind::Profile,
                role.clone(),
                &creds,
            ))),
            Err(e) => {
                tracing::warn!(
                    profile = %self.profile,
                    error = %e,
                    "Configured credential profile unusable, falling through"
                );
                Ok(None)
            }
        }
    }
}

/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`.
#[derive(Debug, Default)]
pub struct EnvironmentSource;

impl EnvironmentSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialSource for EnvironmentSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError> {
        let provider = EnvironmentVariableCredentialsProvider::new();

        match provider.provide_credentials().await {
            Ok(creds) => Ok(Some(Credentials::from_sdk(
                SourceKind::Environment,
                role.clone(),
                &creds,
            ))),
            Err(CredentialsError::CredentialsNotLoaded(_)) => Ok(None),
            Err(e) => {
                tracing::debug!(error = %e, "Environment credentials rejected");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    const ENV_KEYS: [&str; 3] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"];

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(keys: &[&str]) -> Self {
            Self {
                saved: keys
                    .iter()
                    .map(|k| (k.to_string(), env::var(k).ok()))
                    .collect(),
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    fn role() -> Role {
        Role::new("Analyst", None)
    }

    #[tokio::test]
    #[serial]
    async fn test_environment_source_reads_process_env() {
        let _guard = EnvGuard::new(&ENV_KEYS);
        env::set_var("AWS_ACCESS_KEY_ID", "AKIAENVEXAMPLE");
        env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");
        env::set_var("AWS_SESSION_TOKEN", "env-token");

        let creds = EnvironmentSource::new().fetch(&role()).await.unwrap().unwrap();
        assert_eq!(creds.access_key_id, "AKIAENVEXAMPLE");
        assert_eq!(creds.source, SourceKind::Environment);
        assert!(creds.session_token.is_some());
    }

    #[tokio::test]
    #[serial]
    async fn test_environment_source_without_keys_yields_none() {
        let _guard = EnvGuard::new(&ENV_KEYS);
        for key in ENV_KEYS {
            env::remove_var(key);
        }

        let creds = EnvironmentSource::new().fetch(&role()).await.unwrap();
        assert!(creds.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_profile_source_reads_shared_credentials_file() {
        let _guard = EnvGuard::new(&["AWS_SHARED_CREDENTIALS_FILE", "AWS_CONFIG_FILE"]);
        let dir = tempfile::tempdir().unwrap();

        let creds_path = dir.path().join("credentials");
        let mut file = std::fs::File::create(&creds_path).unwrap();
        writeln!(
            file,
            "[analytics]\naws_access_key_id = AKIAPROFILE\naws_secret_access_key = profile-secret"
        )
        .unwrap();
        let config_path = dir.path().join("config");
        std::fs::File::create(&config_path).unwrap();

        env::set_var("AWS_SHARED_CREDENTIALS_FILE", &creds_path);
        env::set_var("AWS_CONFIG_FILE", &config_path);

        let creds = ProfileSource::new("analytics")
            .fetch(&role())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIAPROFILE");
        assert_eq!(creds.source, SourceKind::Profile);

        let missing = ProfileSource::new("nope").fetch(&role()).await.unwrap();
        assert!(missing.is_none());
    }
}
