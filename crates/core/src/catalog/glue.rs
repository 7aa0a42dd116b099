use super::client::{CatalogColumn, CatalogTable, MetadataCatalog, Page};
use crate::aws::AwsTarget;
use crate::credentials::Credentials;
use crate::error::CatalogError;
use async_trait::async_trait;
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::types::Table;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// AWS Glue Data Catalog client.
#[derive(Debug, Clone)]
pub struct GlueCatalog {
    target: AwsTarget,
    endpoint_url: Option<String>,
}

impl GlueCatalog {
    pub fn new(target: AwsTarget, endpoint_url: Option<String>) -> Self {
        Self {
            target,
            endpoint_url,
        }
    }

    fn client(&self, creds: &Credentials) -> aws_sdk_glue::Client {
        let sdk_config = self.target.sdk_config(creds);
        let mut builder = aws_sdk_glue::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        aws_sdk_glue::Client::from_conf(builder.build())
    }

    fn table_arn(&self, database: &str, table: &str) -> Result<String, CatalogError> {
        let account = self
            .target
            .account_id
            .as_deref()
            .ok_or_else(|| unavailable("GetTags", "no account id configured"))?;
        Ok(format!(
            "arn:aws:glue:{}:{}:table/{}/{}",
            self.target.region, account, database, table
        ))
    }
}

fn unavailable(operation: &str, message: impl Into<String>) -> CatalogError {
    CatalogError::Unavailable {
        operation: operation.to_string(),
        message: message.into(),
    }
}

fn to_chrono(t: &aws_sdk_glue::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
}

fn convert_table(database: &str, table: &Table) -> CatalogTable {
    let storage = table.storage_descriptor();
    CatalogTable {
        database: table.database_name().unwrap_or(database).to_string(),
        name: table.name().to_string(),
        description: table.description().map(str::to_string),
        location: storage.and_then(|sd| sd.location()).map(str::to_string),
        columns: storage
            .map(|sd| {
                sd.columns()
                    .iter()
                    .map(|c| CatalogColumn {
                        name: c.name().to_string(),
                        data_type: c.r#type().unwrap_or_default().to_string(),
                        comment: c.comment().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        parameters: table.parameters().cloned().unwrap_or_default(),
        created_at: table.create_time().and_then(to_chrono),
        updated_at: table.update_time().and_then(to_chrono),
    }
}

#[async_trait]
impl MetadataCatalog for GlueCatalog {
    async fn list_databases(
        &self,
        creds: &Credentials,
        next_token: Option<String>,
    ) -> Result<Page<String>, CatalogError> {
        let output = self
            .client(creds)
            .get_databases()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| unavailable("GetDatabases", DisplayErrorContext(&e).to_string()))?;

        Ok(Page {
            items: output
                .database_list()
                .iter()
                .map(|db| db.name().to_string())
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn list_tables(
        &self,
        creds: &Credentials,
        database: &str,
        next_token: Option<String>,
    ) -> Result<Page<CatalogTable>, CatalogError> {
        let output = self
            .client(creds)
            .get_tables()
            .database_name(database)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| unavailable("GetTables", DisplayErrorContext(&e).to_string()))?;

        Ok(Page {
            items: output
                .table_list()
                .iter()
                .map(|t| convert_table(database, t))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_table(
        &self,
        creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<Option<CatalogTable>, CatalogError> {
        let result = self
            .client(creds)
            .get_table()
            .database_name(database)
            .name(table)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.table().map(|t| convert_table(database, t))),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_entity_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(unavailable("GetTable", DisplayErrorContext(&e).to_string())),
        }
    }

    async fn get_tags(
        &self,
        creds: &Credentials,
        database: &str,
        table: &str,
    ) -> Result<HashMap<String, String>, CatalogError> {
        let arn = self.table_arn(database, table)?;
        let output = self
            .client(creds)
            .get_tags()
            .resource_arn(arn)
            .send()
            .await
            .map_err(|e| unavailable("GetTags", DisplayErrorContext(&e).to_string()))?;

        Ok(output.tags().cloned().unwrap_or_default())
    }
}
