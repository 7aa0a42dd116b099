use crate::credentials::Credentials;
use crate::error::CatalogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// One page of a paged enumeration. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub comment: Option<String>,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: None,
        }
    }
}

/// A table definition as the catalog stores it.
#[derive(Debug, Clone, Default)]
pub struct CatalogTable {
    pub database: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub columns: Vec<CatalogColumn>,
    pub parameters: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read-only view of a hierarchical database/table catalog.
///
/// Every call takes the credential snapshot to sign with, so callers
/// control when credentials are refreshed.
#[async_trait]
pub trait MetadataCatalog: Send + Sync + fmt::Debug {
    async fn list_databases(
        &self,
        creds: &Credentials,
        next_token: Option<String>,
    ) -> Result<Page<String>, CatalogError>;

    async fn list_tables(
        &self,
        creds: &Credentials,
        database: &str,
        next_token: Option<String>,
    ) -> Result<Page<CatalogTable>, CatalogError>;

    /// `Ok(None)` when the database or table does not exist.
    async fn get_table(
        &self,
        creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<Option<CatalogTable>, CatalogError>;

    async fn get_tags(
        &self,
        creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<HashMap<String, String>, CatalogError>;
}
