#![allow(dead_code)]

use async_trait::async_trait;
use dmesh_common::config::{EngineSettings, MeshConfig};
use dmesh_core::catalog::{CatalogColumn, CatalogTable, MetadataCatalog, Page};
use dmesh_core::credentials::{CredentialSource, SourceKind};
use dmesh_core::identity::{CallerIdentity, IdentityService};
use dmesh_core::{CatalogError, CredentialError, CredentialProvider, Credentials, Mesh, Role};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Always issues the same static key and counts calls.
#[derive(Debug, Default)]
pub struct StaticSource {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CredentialSource for StaticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Credentials::new(
            SourceKind::Environment,
            role.clone(),
            "AKIATEST",
            "test-secret",
            Some("test-token".to_string()),
        )))
    }
}

pub fn static_provider() -> (Arc<CredentialProvider>, Arc<StaticSource>) {
    let source = Arc::new(StaticSource::default());
    let provider = CredentialProvider::new(
        Role::new("DataAnalyst", Some("123456789012".into())),
        vec![source.clone() as Arc<dyn CredentialSource>],
    );
    (Arc::new(provider), source)
}

#[derive(Debug)]
pub struct FixedIdentity;

#[async_trait]
impl IdentityService for FixedIdentity {
    async fn caller_identity(&self, _creds: &Credentials) -> Result<CallerIdentity, CredentialError> {
        Ok(CallerIdentity {
            arn: "arn:aws:sts::123456789012:assumed-role/DataAnalyst/test".to_string(),
            account: Some("123456789012".to_string()),
            user_id: None,
        })
    }
}

/// Catalog fake with configurable paging and failure injection.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    databases: Vec<String>,
    tables: HashMap<String, Vec<CatalogTable>>,
    tags: HashMap<(String, String), HashMap<String, String>>,
    page_size: Option<usize>,
    failing_domains: HashSet<String>,
    fail_database_listing: bool,
    fail_tags: bool,
    pub calls: AtomicUsize,
}

pub fn product_table(database: &str, name: &str, params: &[(&str, &str)], location: &str) -> CatalogTable {
    CatalogTable {
        database: database.to_string(),
        name: name.to_string(),
        description: Some(format!("{} {}", database, name)),
        location: Some(location.to_string()),
        columns: vec![
            CatalogColumn::new("id", "bigint"),
            CatalogColumn {
                name: "amount".to_string(),
                data_type: "double".to_string(),
                comment: Some("order total".to_string()),
            },
        ],
        parameters: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        created_at: chrono::DateTime::from_timestamp(1_704_067_200, 0),
        updated_at: None,
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: CatalogTable) -> Self {
        if !self.databases.contains(&table.database) {
            self.databases.push(table.database.clone());
        }
        self.tables
            .entry(table.database.clone())
            .or_default()
            .push(table);
        self
    }

    pub fn with_database(mut self, database: &str) -> Self {
        if !self.databases.iter().any(|d| d == database) {
            self.databases.push(database.to_string());
        }
        self
    }

    pub fn with_tags(mut self, database: &str, table: &str, tags: &[(&str, &str)]) -> Self {
        self.tags.insert(
            (database.to_string(), table.to_string()),
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn failing_domain(mut self, database: &str) -> Self {
        self.failing_domains.insert(database.to_string());
        self
    }

    pub fn failing_database_listing(mut self) -> Self {
        self.fail_database_listing = true;
        self
    }

    pub fn failing_tags(mut self) -> Self {
        self.fail_tags = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page<T: Clone>(&self, items: &[T], next_token: Option<String>) -> Page<T> {
        let start: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let size = self.page_size.unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(items.len());
        Page {
            items: items[start..end].to_vec(),
            next_token: (end < items.len()).then(|| end.to_string()),
        }
    }
}

#[async_trait]
impl MetadataCatalog for InMemoryCatalog {
    async fn list_databases(
        &self,
        _creds: &Credentials,
        next_token: Option<String>,
    ) -> Result<Page<String>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_database_listing {
            return Err(CatalogError::Unavailable {
                operation: "GetDatabases".into(),
                message: "AccessDeniedException".into(),
            });
        }
        Ok(self.page(&self.databases, next_token))
    }

    async fn list_tables(
        &self,
        _creds: &Credentials,
        database: &str,
        next_token: Option<String>,
    ) -> Result<Page<CatalogTable>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.get(database).cloned().unwrap_or_default();
        // Fail on the second page so partial results would be visible if kept
        if self.failing_domains.contains(database) && next_token.is_some() {
            return Err(CatalogError::Unavailable {
                operation: "GetTables".into(),
                message: "ThrottlingException".into(),
            });
        }
        let page = self.page(&tables, next_token);
        if self.failing_domains.contains(database) && page.next_token.is_none() {
            return Err(CatalogError::Unavailable {
                operation: "GetTables".into(),
                message: "ThrottlingException".into(),
            });
        }
        Ok(page)
    }

    async fn get_table(
        &self,
        _creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<Option<CatalogTable>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables
            .get(database)
            .and_then(|tables| tables.iter().find(|t| t.name == table))
            .cloned())
    }

    async fn get_tags(
        &self,
        _creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<HashMap<String, String>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tags {
            return Err(CatalogError::Unavailable {
                operation: "GetTags".into(),
                message: "AccessDeniedException".into(),
            });
        }
        Ok(self
            .tags
            .get(&(database.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Config for local-only sessions: no object-storage extension.
pub fn local_config() -> MeshConfig {
    MeshConfig {
        engine: EngineSettings {
            install_extensions: false,
            object_storage: false,
            memory_limit_mb: None,
        },
        ..MeshConfig::default()
    }
}

pub fn mesh(catalog: Arc<InMemoryCatalog>) -> Mesh {
    let (provider, _) = static_provider();
    Mesh::with_services(
        provider,
        catalog as Arc<dyn MetadataCatalog>,
        Arc::new(FixedIdentity),
        &local_config(),
    )
}
