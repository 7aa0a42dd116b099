//! Data product discovery and resolution over a metadata catalog.
//!
//! A catalog database is a domain, a table is a product. Only tables whose
//! parameters carry [`MARKER_KEY`] are data products; everything else is
//! invisible to listing and resolution.

mod client;
mod glue;
mod schema;

pub use client::{CatalogColumn, CatalogTable, MetadataCatalog, Page};
pub use glue::GlueCatalog;
pub use schema::{SchemaDocument, SchemaField};

use crate::credentials::{CredentialProvider, Credentials};
use crate::error::CatalogError;
use crate::name::ProductName;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Presence of this table parameter, with any value, marks a data product.
pub const MARKER_KEY: &str = "data_product";
pub const FORMAT_KEY: &str = "table_format";
pub const TYPE_KEY: &str = "data_product_type";
pub const OWNER_KEY: &str = "owner";

/// Assumed when a product declares no `table_format`.
pub const DEFAULT_FORMAT: StorageFormat = StorageFormat::Iceberg;

/// Storage format a product declares in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageFormat {
    Iceberg,
    Delta,
    Parquet,
    Other(String),
}

impl StorageFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "iceberg" => StorageFormat::Iceberg,
            "delta" => StorageFormat::Delta,
            "parquet" => StorageFormat::Parquet,
            _ => StorageFormat::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StorageFormat::Iceberg => "iceberg",
            StorageFormat::Delta => "delta",
            StorageFormat::Parquet => "parquet",
            StorageFormat::Other(s) => s,
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StorageFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Everything presentation layers need to show about one product.
/// Built fresh on every resolution.
#[derive(Debug, Clone, Serialize)]
pub struct DataProductDescriptor {
    pub qualified_name: ProductName,
    pub domain: String,
    pub description: String,
    pub product_type: String,
    pub location: String,
    pub format: StorageFormat,
    pub owner: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
}

impl DataProductDescriptor {
    fn from_table(name: ProductName, table: CatalogTable, tags: HashMap<String, String>) -> Self {
        let param = |key: &str| table.parameters.get(key).cloned().unwrap_or_default();
        let format = table
            .parameters
            .get(FORMAT_KEY)
            .filter(|f| !f.trim().is_empty())
            .map(|f| StorageFormat::parse(f))
            .unwrap_or(DEFAULT_FORMAT);

        Self {
            domain: name.domain().to_string(),
            product_type: param(TYPE_KEY),
            owner: param(OWNER_KEY),
            qualified_name: name,
            description: table.description.unwrap_or_default(),
            location: table.location.unwrap_or_default(),
            format,
            created_at: table.created_at,
            updated_at: table.updated_at,
            tags,
        }
    }
}

pub fn is_data_product(table: &CatalogTable) -> bool {
    table.parameters.contains_key(MARKER_KEY)
}

/// Maps product names to catalog entries. Holds no cache of its own.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    credentials: Arc<CredentialProvider>,
    catalog: Arc<dyn MetadataCatalog>,
}

impl CatalogResolver {
    pub fn new(credentials: Arc<CredentialProvider>, catalog: Arc<dyn MetadataCatalog>) -> Self {
        Self {
            credentials,
            catalog,
        }
    }

    /// Every data product, optionally only those in the domain named exactly
    /// `domain_filter`. An empty filter means no filter.
    pub async fn list(&self, domain_filter: Option<&str>) -> Result<Vec<ProductName>, CatalogError> {
        let domain_filter = domain_filter.filter(|d| !d.is_empty());
        let creds = self.credentials.current().await?;

        let domains = self
            .all_databases(&creds)
            .await
            .map_err(|e| match e {
                CatalogError::Credentials(_) => e,
                other => CatalogError::ListFailed {
                    message: other.to_string(),
                },
            })?;

        let mut products = Vec::new();
        for domain in domains
            .iter()
            .filter(|d| domain_filter.map_or(true, |f| f == d.as_str()))
        {
            match self.products_in(&creds, domain).await {
                Ok(mut found) => products.append(&mut found),
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "Skipping domain, table enumeration failed");
                }
            }
        }

        tracing::debug!(count = products.len(), filter = ?domain_filter, "Listed data products");
        Ok(products)
    }

    pub async fn resolve(&self, qualified_name: &str) -> Result<DataProductDescriptor, CatalogError> {
        let name = ProductName::parse(qualified_name)?;
        let creds = self.credentials.current().await?;
        let table = self.product_table(&creds, &name).await?;

        let tags = match self
            .catalog
            .get_tags(&creds, name.domain(), name.product())
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(product = %name, error = %e, "Tag lookup failed, continuing without tags");
                HashMap::new()
            }
        };

        Ok(DataProductDescriptor::from_table(name, table, tags))
    }

    pub async fn location_of(&self, qualified_name: &str) -> Result<String, CatalogError> {
        Ok(self.resolve(qualified_name).await?.location)
    }

    pub async fn schema_of(&self, qualified_name: &str) -> Result<SchemaDocument, CatalogError> {
        let name = ProductName::parse(qualified_name)?;
        let creds = self.credentials.current().await?;
        let table = self.product_table(&creds, &name).await?;
        Ok(SchemaDocument::from_columns(&table.columns))
    }

    async fn product_table(
        &self,
        creds: &Credentials,
        name: &ProductName,
    ) -> Result<CatalogTable, CatalogError> {
        let table = self
            .catalog
            .get_table(creds, name.domain(), name.product())
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_string(),
            })?;

        if !is_data_product(&table) {
            return Err(CatalogError::NotADataProduct {
                name: name.to_string(),
            });
        }
        Ok(table)
    }

    async fn all_databases(&self, creds: &Credentials) -> Result<Vec<String>, CatalogError> {
        let mut databases = Vec::new();
        let mut next_token = None;
        loop {
            let page = self.catalog.list_databases(creds, next_token).await?;
            databases.extend(page.items);
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(databases),
            }
        }
    }

    /// Marked tables of one domain. Any page failure discards the whole domain;
    /// entries whose names cannot be parsed back are skipped.
    async fn products_in(
        &self,
        creds: &Credentials,
        domain: &str,
    ) -> Result<Vec<ProductName>, CatalogError> {
        let mut products = Vec::new();
        let mut next_token = None;
        loop {
            let page = self.catalog.list_tables(creds, domain, next_token).await?;
            for table in page.items.iter().filter(|t| is_data_product(t)) {
                // A `.` in either segment would not survive a round trip through resolve.
                match ProductName::parse(&format!("{}.{}", domain, table.name)) {
                    Ok(name) => products.push(name),
                    Err(_) => tracing::warn!(
                        domain = %domain,
                        table = %table.name,
                        "Skipping data product, name is not addressable as domain.product"
                    ),
                }
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(products),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(params: &[(&str, &str)]) -> CatalogTable {
        CatalogTable {
            database: "sales".into(),
            name: "orders".into(),
            location: Some("s3://lake/sales/orders/".into()),
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_marker_presence_not_value() {
        assert!(is_data_product(&table(&[("data_product", "false")])));
        assert!(is_data_product(&table(&[("data_product", "")])));
        assert!(!is_data_product(&table(&[("table_format", "iceberg")])));
    }

    #[test]
    fn test_format_defaults_to_iceberg() {
        let name = ProductName::parse("sales.orders").unwrap();
        let d = DataProductDescriptor::from_table(name.clone(), table(&[("data_product", "true")]), HashMap::new());
        assert_eq!(d.format, StorageFormat::Iceberg);

        let d = DataProductDescriptor::from_table(
            name,
            table(&[("data_product", "true"), ("table_format", "Delta"), ("owner", "sales-eng")]),
            HashMap::new(),
        );
        assert_eq!(d.format, StorageFormat::Delta);
        assert_eq!(d.owner, "sales-eng");
        assert_eq!(d.domain, "sales");
    }

    #[test]
    fn test_unknown_format_is_preserved() {
        assert_eq!(StorageFormat::parse("hudi"), StorageFormat::Other("hudi".into()));
        assert_eq!(StorageFormat::parse(" PARQUET "), StorageFormat::Parquet);
    }

    #[test]
    fn test_descriptor_serializes_flat() {
        let name = ProductName::parse("sales.orders").unwrap();
        let d = DataProductDescriptor::from_table(name, table(&[("data_product", "true")]), HashMap::new());
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["qualified_name"], "sales.orders");
        assert_eq!(value["format"], "iceberg");
    }
}
