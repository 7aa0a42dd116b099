use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following DMESH-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Credential errors
/// - **2000-2999**: Catalog errors
/// - **3000-3999**: Query errors
/// - **4000-4999**: Configuration errors
/// - **5000-5999**: Internal/System errors
///
/// Codes are stable across versions (semver contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Credential Errors (1000-1999) ===
    /// DMESH-1001: No credential source produced credentials
    NoCredentialSource = 1001,
    /// DMESH-1002: Cached SSO token has expired
    SsoTokenExpired = 1002,
    /// DMESH-1003: Role credential exchange failed
    BrokerFailure = 1003,
    /// DMESH-1004: Switching the active role failed
    AssumeRoleFailed = 1004,
    /// DMESH-1005: SSO token cache file unreadable
    TokenCacheUnreadable = 1005,
    /// DMESH-1006: Caller identity could not be verified
    IdentityUnavailable = 1006,

    // === Catalog Errors (2000-2999) ===
    /// DMESH-2001: Data product name is not `domain.product`
    MalformedName = 2001,
    /// DMESH-2002: No catalog entry for the name
    ProductNotFound = 2002,
    /// DMESH-2003: Catalog entry lacks the data product marker
    NotADataProduct = 2003,
    /// DMESH-2004: Top-level catalog enumeration failed
    ListFailed = 2004,
    /// DMESH-2005: Catalog call failed
    CatalogUnavailable = 2005,

    // === Query Errors (3000-3999) ===
    /// DMESH-3001: Engine connection or extension setup failed
    EngineInitFailed = 3001,
    /// DMESH-3002: Relation registration failed
    RegistrationFailed = 3002,
    /// DMESH-3003: SQL execution failed
    ExecutionFailed = 3003,
    /// DMESH-3004: Result materialization failed
    RowScanFailed = 3004,
    /// DMESH-3005: Session already released
    SessionClosed = 3005,

    // === Configuration Errors (4000-4999) ===
    /// DMESH-4001: Invalid YAML syntax
    InvalidYaml = 4001,
    /// DMESH-4002: Configuration failed validation
    InvalidConfig = 4002,
    /// DMESH-4003: Config file exists but could not be read
    ConfigUnreadable = 4003,

    // === Internal Errors (5000-5999) ===
    /// DMESH-5001: Serialization/deserialization failed
    SerializationFailed = 5001,
    /// DMESH-5002: Unexpected internal state
    Internal = 5002,

    /// DMESH-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "DMESH-2002")
    pub fn as_str(&self) -> String {
        format!("DMESH-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Credentials,
            2000..=2999 => ErrorCategory::Catalog,
            3000..=3999 => ErrorCategory::Query,
            4000..=4999 => ErrorCategory::Config,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("DMESH-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::NoCredentialSource),
            1002 => Ok(Self::SsoTokenExpired),
            1003 => Ok(Self::BrokerFailure),
            1004 => Ok(Self::AssumeRoleFailed),
            1005 => Ok(Self::TokenCacheUnreadable),
            1006 => Ok(Self::IdentityUnavailable),
            2001 => Ok(Self::MalformedName),
            2002 => Ok(Self::ProductNotFound),
            2003 => Ok(Self::NotADataProduct),
            2004 => Ok(Self::ListFailed),
            2005 => Ok(Self::CatalogUnavailable),
            3001 => Ok(Self::EngineInitFailed),
            3002 => Ok(Self::RegistrationFailed),
            3003 => Ok(Self::ExecutionFailed),
            3004 => Ok(Self::RowScanFailed),
            3005 => Ok(Self::SessionClosed),
            4001 => Ok(Self::InvalidYaml),
            4002 => Ok(Self::InvalidConfig),
            4003 => Ok(Self::ConfigUnreadable),
            5001 => Ok(Self::SerializationFailed),
            5002 => Ok(Self::Internal),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used for exit-code mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Credentials,
    Catalog,
    Query,
    Config,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(ErrorCode::NoCredentialSource.as_str(), "DMESH-1001");
        assert_eq!(ErrorCode::MalformedName.as_str(), "DMESH-2001");
        assert_eq!(ErrorCode::Unknown.as_str(), "DMESH-9999");
    }

    #[test]
    fn test_error_code_parsing() {
        assert_eq!(
            ErrorCode::try_from("DMESH-2003".to_string()).unwrap(),
            ErrorCode::NotADataProduct
        );
        assert!(ErrorCode::try_from("ERR-2003".to_string()).is_err());
        assert!(ErrorCode::try_from("DMESH-0000".to_string()).is_err());
        assert!(ErrorCode::try_from("DMESH-ABC".to_string()).is_err());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ErrorCode::SsoTokenExpired.category(),
            ErrorCategory::Credentials
        );
        assert_eq!(ErrorCode::ListFailed.category(), ErrorCategory::Catalog);
        assert_eq!(ErrorCode::RowScanFailed.category(), ErrorCategory::Query);
        assert_eq!(ErrorCode::InvalidYaml.category(), ErrorCategory::Config);
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Internal);
    }
}
