use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical data product identifier, `domain.product`.
///
/// Parsing is the only way to build one, so every instance splits into
/// exactly two non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName {
    domain: String,
    product: String,
}

impl ProductName {
    pub fn parse(name: &str) -> Result<Self, CatalogError> {
        let malformed = || CatalogError::MalformedName {
            name: name.to_string(),
        };

        let mut parts = name.split('.');
        let (domain, product) = match (parts.next(), parts.next(), parts.next()) {
            (Some(domain), Some(product), None) => (domain, product),
            _ => return Err(malformed()),
        };

        if domain.is_empty() || product.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            domain: domain.to_string(),
            product: product.to_string(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.product)
    }
}

impl FromStr for ProductName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductName {
    type Error = CatalogError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProductName> for String {
    fn from(name: ProductName) -> String {
        name.to_string()
    }
}
