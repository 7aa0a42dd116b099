use async_trait::async_trait;
use dmesh_common::config::MeshConfig;
use dmesh_core::catalog::{CatalogColumn, CatalogTable, MetadataCatalog, Page};
use dmesh_core::credentials::{CredentialSource, SourceKind};
use dmesh_core::identity::{CallerIdentity, IdentityService};
use dmesh_core::{CatalogError, CredentialError, CredentialProvider, Credentials, Mesh, Role};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub(super) struct StaticSource;

#[async_trait]
impl CredentialSource for StaticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    async fn fetch(&self, role: &Role) -> Result<Option<Credentials>, CredentialError> {
        Ok(Some(Credentials::new(
            SourceKind::Environment,
            role.clone(),
            "AKIATEST",
            "test-secret",
            None,
        )))
    }
}

#[derive(Debug)]
pub(super) struct FakeIdentity {
    pub fail: bool,
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn caller_identity(&self, _creds: &Credentials) -> Result<CallerIdentity, CredentialError> {
        if self.fail {
            return Err(CredentialError::IdentityUnavailable {
                message: "sts unreachable".to_string(),
            });
        }
        Ok(CallerIdentity {
            arn: "arn:aws:sts::123456789012:assumed-role/DataAnalyst/cli".to_string(),
            account: Some("123456789012".to_string()),
            user_id: None,
        })
    }
}

/// Single-page catalog keyed by database.
#[derive(Debug, Default)]
pub(super) struct FakeCatalog {
    tables: HashMap<String, Vec<CatalogTable>>,
}

impl FakeCatalog {
    pub fn with_table(mut self, database: &str, name: &str, marked: bool) -> Self {
        let mut parameters = HashMap::new();
        if marked {
            parameters.insert("data_product".to_string(), "true".to_string());
            parameters.insert("table_format".to_string(), "parquet".to_string());
        }
        self.tables
            .entry(database.to_string())
            .or_default()
            .push(CatalogTable {
                database: database.to_string(),
                name: name.to_string(),
                location: Some(format!("s3://lake/{}/{}/", database, name)),
                columns: vec![
                    CatalogColumn::new("id", "bigint"),
                    CatalogColumn::new("amount", "double"),
                ],
                parameters,
                ..Default::default()
            });
        self
    }
}

#[async_trait]
impl MetadataCatalog for FakeCatalog {
    async fn list_databases(
        &self,
        _creds: &Credentials,
        _next_token: Option<String>,
    ) -> Result<Page<String>, CatalogError> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        Ok(Page::last(names))
    }

    async fn list_tables(
        &self,
        _creds: &Credentials,
        database: &str,
        _next_token: Option<String>,
    ) -> Result<Page<CatalogTable>, CatalogError> {
        Ok(Page::last(self.tables.get(database).cloned().unwrap_or_default()))
    }

    async fn get_table(
        &self,
        _creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<Option<CatalogTable>, CatalogError> {
        Ok(self
            .tables
            .get(database)
            .and_then(|t| t.iter().find(|t| t.name == table).cloned()))
    }

    async fn get_tags(
        &self,
        _creds: &Credentials,
        _database: &str,
        _table: &str,
    ) -> Result<HashMap<String, String>, CatalogError> {
        Ok(HashMap::new())
    }
}

pub(super) fn test_mesh(catalog: FakeCatalog, identity_fails: bool) -> Mesh {
    let provider = CredentialProvider::new(
        Role::new("DataAnalyst", Some("123456789012".into())),
        vec![Arc::new(StaticSource) as Arc<dyn CredentialSource>],
    );
    let mut config = MeshConfig::default();
    config.engine.object_storage = false;
    config.engine.install_extensions = false;
    Mesh::with_services(
        Arc::new(provider),
        Arc::new(catalog),
        Arc::new(FakeIdentity {
            fail: identity_fails,
        }),
        &config,
    )
}

pub(super) fn sales_catalog() -> FakeCatalog {
    FakeCatalog::default()
        .with_table("sales", "orders", true)
        .with_table("sales", "scratch", false)
        .with_table("finance", "ledger", true)
}
