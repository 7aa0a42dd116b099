use dmesh_common::config::MeshConfig;
use dmesh_core::credentials::SourceKind;
use dmesh_core::{CredentialError, CredentialProvider};
use serial_test::serial;
use std::env;

const AWS_ENV: [&str; 5] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SHARED_CREDENTIALS_FILE",
    "AWS_CONFIG_FILE",
];

/// Restores the AWS variables present before the test.
struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn clear() -> Self {
        let saved = AWS_ENV.iter().map(|k| (*k, env::var(k).ok())).collect();
        for key in AWS_ENV {
            env::remove_var(key);
        }
        Self { saved }
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

fn config_with_cache(dir: &std::path::Path) -> MeshConfig {
    let mut config = MeshConfig::default();
    config.default_role = Some("DataAnalyst".to_string());
    config.aws_account_id = Some("123456789012".to_string());
    config.credentials.sso_cache_dir = Some(dir.to_path_buf());
    config.credentials.broker_program = "dmesh-test-no-such-binary".to_string();
    config
}

#[tokio::test]
#[serial]
async fn test_empty_environment_and_cache_is_no_source() {
    let _guard = EnvGuard::clear();
    let cache = tempfile::tempdir().unwrap();

    let provider = CredentialProvider::from_config(&config_with_cache(cache.path()));
    let err = provider.current().await.unwrap_err();
    assert!(matches!(err, CredentialError::NoSource));
}

#[tokio::test]
#[serial]
async fn test_environment_beats_sso_cache() {
    let _guard = EnvGuard::clear();
    env::set_var("AWS_ACCESS_KEY_ID", "AKIAFROMENV");
    env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");

    let cache = tempfile::tempdir().unwrap();
    std::fs::write(
        cache.path().join("token.json"),
        r#"{"expiresAt":"2099-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let provider = CredentialProvider::from_config(&config_with_cache(cache.path()));
    let creds = provider.current().await.unwrap();
    assert_eq!(creds.source, SourceKind::Environment);
    assert_eq!(creds.access_key_id, "AKIAFROMENV");
    assert_eq!(provider.role().await.name, "DataAnalyst");
}

#[tokio::test]
#[serial]
async fn test_expired_sso_token_asks_for_login() {
    let _guard = EnvGuard::clear();
    let cache = tempfile::tempdir().unwrap();
    std::fs::write(
        cache.path().join("token.json"),
        r#"{"expiresAt":"2020-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let provider = CredentialProvider::from_config(&config_with_cache(cache.path()));
    let err = provider.acquire().await.unwrap_err();
    assert!(matches!(err, CredentialError::TokenExpired { .. }));
}

#[tokio::test]
#[serial]
async fn test_broker_failure_surfaces_from_valid_token() {
    let _guard = EnvGuard::clear();
    let cache = tempfile::tempdir().unwrap();
    std::fs::write(
        cache.path().join("token.json"),
        r#"{"expiresAt":"2099-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let provider = CredentialProvider::from_config(&config_with_cache(cache.path()));
    let err = provider.acquire().await.unwrap_err();
    assert!(matches!(err, CredentialError::BrokerFailure { .. }));
}
