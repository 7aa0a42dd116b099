use crate::credentials::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_types::region::Region;
use aws_types::SdkConfig;
use dmesh_common::config::MeshConfig;

/// Region and account every service client targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsTarget {
    pub region: String,
    pub account_id: Option<String>,
}

impl AwsTarget {
    pub fn new(region: impl Into<String>, account_id: Option<String>) -> Self {
        Self {
            region: region.into(),
            account_id,
        }
    }

    /// SDK configuration pinned to one credential snapshot.
    pub fn sdk_config(&self, creds: &Credentials) -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(creds.to_sdk()))
            .build()
    }
}

impl From<&MeshConfig> for AwsTarget {
    fn from(config: &MeshConfig) -> Self {
        Self::new(config.aws_region.clone(), config.aws_account_id.clone())
    }
}
