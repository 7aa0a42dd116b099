//! Caller identity lookup and access-attempt auditing.
//!
//! The auditor records who asked for which product. It makes no grant or
//! deny decision; policy stays with the external identity provider.

use crate::aws::AwsTarget;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::CredentialError;
use crate::name::ProductName;
use async_trait::async_trait;
use dmesh_common::telemetry::AUDIT_TARGET;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub arn: String,
    pub account: Option<String>,
    pub user_id: Option<String>,
}

#[async_trait]
pub trait IdentityService: Send + Sync + fmt::Debug {
    async fn caller_identity(&self, creds: &Credentials) -> Result<CallerIdentity, CredentialError>;
}

/// `sts:GetCallerIdentity`.
#[derive(Debug, Clone)]
pub struct StsIdentityService {
    target: AwsTarget,
}

impl StsIdentityService {
    pub fn new(target: AwsTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl IdentityService for StsIdentityService {
    async fn caller_identity(&self, creds: &Credentials) -> Result<CallerIdentity, CredentialError> {
        let client = aws_sdk_sts::Client::new(&self.target.sdk_config(creds));
        let output = client.get_caller_identity().send().await.map_err(|e| {
            CredentialError::IdentityUnavailable {
                message: aws_sdk_sts::error::DisplayErrorContext(&e).to_string(),
            }
        })?;

        let arn = output
            .arn()
            .ok_or_else(|| CredentialError::IdentityUnavailable {
                message: "response carried no caller ARN".to_string(),
            })?
            .to_string();

        Ok(CallerIdentity {
            arn,
            account: output.account().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AccessAuditor {
    credentials: Arc<CredentialProvider>,
    identity: Arc<dyn IdentityService>,
}

impl AccessAuditor {
    pub fn new(credentials: Arc<CredentialProvider>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            credentials,
            identity,
        }
    }

    pub async fn whoami(&self) -> Result<CallerIdentity, CredentialError> {
        let creds = self.credentials.current().await?;
        self.identity.caller_identity(&creds).await
    }

    /// Log an access attempt on the audit target and return the caller.
    pub async fn record_access(&self, product: &ProductName) -> Result<CallerIdentity, CredentialError> {
        let creds = self.credentials.current().await?;
        let caller = self.identity.caller_identity(&creds).await?;

        tracing::info!(
            target: AUDIT_TARGET,
            caller = %caller.arn,
            role = %creds.role,
            product = %product,
            "Data product access requested"
        );

        Ok(caller)
    }
}
