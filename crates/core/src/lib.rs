//! dmesh core: credentials, catalog resolution and query federation for
//! data mesh products.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ CredentialProvider │ profile > environment > SSO cache + broker
//! └─────────┬──────────┘
//!      ┌────┴──────────────┐
//! ┌────┴───────────┐ ┌─────┴─────────────────┐
//! │ CatalogResolver│─│ QueryFederationBridge │ DuckDB sessions
//! └────────────────┘ └───────────────────────┘
//! ```
//!
//! [`Mesh`] builds the graph once from a [`MeshConfig`] so callers share
//! one provider.

pub mod aws;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod federation;
pub mod identity;
pub mod name;

pub use catalog::{CatalogResolver, DataProductDescriptor, StorageFormat};
pub use credentials::{CredentialProvider, Credentials, Role};
pub use error::{CatalogError, CredentialError, QueryError};
pub use federation::{QueryFederationBridge, QueryResult, QuerySession};
pub use identity::AccessAuditor;
pub use name::ProductName;

use aws::AwsTarget;
use catalog::{GlueCatalog, MetadataCatalog};
use dmesh_common::config::MeshConfig;
use identity::{IdentityService, StsIdentityService};
use std::sync::Arc;

/// The wired component graph.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub credentials: Arc<CredentialProvider>,
    pub catalog: CatalogResolver,
    pub federation: QueryFederationBridge,
    pub auditor: AccessAuditor,
}

impl Mesh {
    pub fn from_config(config: &MeshConfig) -> Self {
        let target = AwsTarget::from(config);
        let catalog: Arc<dyn MetadataCatalog> = Arc::new(GlueCatalog::new(
            target.clone(),
            config.catalog.endpoint_url.clone(),
        ));
        let identity: Arc<dyn IdentityService> = Arc::new(StsIdentityService::new(target));

        Self::with_services(
            Arc::new(CredentialProvider::from_config(config)),
            catalog,
            identity,
            config,
        )
    }

    /// Wire the graph around caller-supplied services.
    pub fn with_services(
        credentials: Arc<CredentialProvider>,
        catalog: Arc<dyn MetadataCatalog>,
        identity: Arc<dyn IdentityService>,
        config: &MeshConfig,
    ) -> Self {
        let resolver = CatalogResolver::new(credentials.clone(), catalog);
        let federation = QueryFederationBridge::new(
            credentials.clone(),
            resolver.clone(),
            config.engine.clone(),
            config.aws_region.clone(),
        );
        let auditor = AccessAuditor::new(credentials.clone(), identity);

        Self {
            credentials,
            catalog: resolver,
            federation,
            auditor,
        }
    }
}
