use chrono::{DateTime, Utc};
use dmesh_error::{Coded, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

const SSO_LOGIN_HINT: &str = "Run `aws sso login` and retry";

/// Failures while obtaining or refreshing cloud credentials.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No credential source available (profile, environment and SSO cache all exhausted)")]
    NoSource,

    #[error("SSO token expired at {expired_at}")]
    TokenExpired { expired_at: DateTime<Utc> },

    #[error("Role credential exchange failed: {message}")]
    BrokerFailure { message: String },

    #[error("Failed to assume role '{role}': {source}")]
    AssumeRoleFailed {
        role: String,
        #[source]
        source: Box<CredentialError>,
    },

    #[error("Unreadable SSO token cache file {path:?}: {message}")]
    TokenCache { path: PathBuf, message: String },

    #[error("Caller identity lookup failed: {message}")]
    IdentityUnavailable { message: String },
}

impl Coded for CredentialError {
    fn code(&self) -> ErrorCode {
        match self {
            CredentialError::NoSource => ErrorCode::NoCredentialSource,
            CredentialError::TokenExpired { .. } => ErrorCode::SsoTokenExpired,
            CredentialError::BrokerFailure { .. } => ErrorCode::BrokerFailure,
            CredentialError::AssumeRoleFailed { .. } => ErrorCode::AssumeRoleFailed,
            CredentialError::TokenCache { .. } => ErrorCode::TokenCacheUnreadable,
            CredentialError::IdentityUnavailable { .. } => ErrorCode::IdentityUnavailable,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            CredentialError::NoSource
            | CredentialError::TokenExpired { .. }
            | CredentialError::TokenCache { .. } => Some(SSO_LOGIN_HINT.to_string()),
            CredentialError::AssumeRoleFailed { source, .. } => source.hint(),
            CredentialError::BrokerFailure { .. } => {
                Some("Check the role name and account id, then run `aws sso login`".to_string())
            }
            CredentialError::IdentityUnavailable { .. } => None,
        }
    }
}

/// Failures while resolving or enumerating data products.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid data product name '{name}', expected domain.product")]
    MalformedName { name: String },

    #[error("Data product not found: {name}")]
    NotFound { name: String },

    #[error("Table is not marked as a data product: {name}")]
    NotADataProduct { name: String },

    #[error("Failed to list data products: {message}")]
    ListFailed { message: String },

    #[error("Catalog {operation} failed: {message}")]
    Unavailable { operation: String, message: String },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl Coded for CatalogError {
    fn code(&self) -> ErrorCode {
        match self {
            CatalogError::MalformedName { .. } => ErrorCode::MalformedName,
            CatalogError::NotFound { .. } => ErrorCode::ProductNotFound,
            CatalogError::NotADataProduct { .. } => ErrorCode::NotADataProduct,
            CatalogError::ListFailed { .. } => ErrorCode::ListFailed,
            CatalogError::Unavailable { .. } => ErrorCode::CatalogUnavailable,
            CatalogError::Credentials(e) => e.code(),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            CatalogError::NotFound { .. } => {
                Some("Check the spelling, or run `dmesh discover` to list products".to_string())
            }
            CatalogError::NotADataProduct { .. } => Some(
                "The table exists but is not published as a data product; ask its owner to register it"
                    .to_string(),
            ),
            CatalogError::Credentials(e) => e.hint(),
            _ => None,
        }
    }
}

/// Failures inside an analytical engine session.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Failed to initialize query engine: {message}")]
    EngineInitFailed { message: String },

    #[error("Failed to register data product '{name}': {message}")]
    RegistrationFailed { name: String, message: String },

    #[error("Query execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Failed to read query results: {message}")]
    RowScanFailed { message: String },

    #[error("Query session is closed")]
    SessionClosed,

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl Coded for QueryError {
    fn code(&self) -> ErrorCode {
        match self {
            QueryError::EngineInitFailed { .. } => ErrorCode::EngineInitFailed,
            QueryError::RegistrationFailed { .. } => ErrorCode::RegistrationFailed,
            QueryError::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
            QueryError::RowScanFailed { .. } => ErrorCode::RowScanFailed,
            QueryError::SessionClosed => ErrorCode::SessionClosed,
            QueryError::Credentials(e) => e.code(),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            QueryError::SessionClosed => Some("Open a new session".to_string()),
            QueryError::Credentials(e) => e.hint(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmesh_error::ErrorCategory;

    #[test]
    fn test_assume_role_failure_keeps_inner_hint() {
        let err = CredentialError::AssumeRoleFailed {
            role: "Analyst".into(),
            source: Box::new(CredentialError::NoSource),
        };
        assert_eq!(err.code(), ErrorCode::AssumeRoleFailed);
        assert_eq!(err.hint().as_deref(), Some(SSO_LOGIN_HINT));
        assert!(err.to_string().contains("Analyst"));
    }

    #[test]
    fn test_wrapped_credential_errors_keep_their_code() {
        let err = CatalogError::from(CredentialError::NoSource);
        assert_eq!(err.code().category(), ErrorCategory::Credentials);

        let err = QueryError::from(CredentialError::BrokerFailure {
            message: "exit status 255".into(),
        });
        assert_eq!(err.code(), ErrorCode::BrokerFailure);
    }

    #[test]
    fn test_not_found_and_not_a_product_are_distinct() {
        let missing = CatalogError::NotFound {
            name: "sales.ordrs".into(),
        };
        let unmarked = CatalogError::NotADataProduct {
            name: "sales.staging".into(),
        };
        assert_ne!(missing.code(), unmarked.code());
        assert_ne!(missing.hint(), unmarked.hint());
    }
}
