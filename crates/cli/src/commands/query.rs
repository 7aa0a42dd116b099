//! `query`: run SQL against one data product.

use super::helpers::{finish, spinner, QueryOutput};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use dmesh_core::{Mesh, ProductName};
use owo_colors::OwoColorize;

pub async fn query(mesh: &Mesh, sql: &str, product: &str, format: OutputFormat) -> Result<()> {
    let name = ProductName::parse(product)?;
    mesh.auditor.record_access(&name).await?;

    let pb = spinner(format, format!("Querying '{}'...", name));
    let result = mesh.federation.query_product(product, sql).await;
    finish(pb);
    let result = result?;

    match format {
        OutputFormat::Human => {
            if result.columns.is_empty() {
                println!("{}", "Statement executed, no result columns.".dimmed());
            } else {
                println!("{}", output::render_table(&result));
            }
        }
        OutputFormat::Csv => print!("{}", output::render_csv(&result)),
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_success(
                format,
                QueryOutput {
                    product: name.to_string(),
                    row_count: result.row_count(),
                    rows: result.records(),
                    columns: result.columns,
                },
            )?;
        }
    }
    Ok(())
}
