//! `info` and `schema`: inspect one data product.

use super::helpers::{finish, spinner, SchemaResult};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use dmesh_core::Mesh;
use owo_colors::OwoColorize;
use std::fs;
use std::path::Path;

pub async fn info(mesh: &Mesh, product: &str, format: OutputFormat) -> Result<()> {
    let pb = spinner(format, format!("Resolving '{}'...", product));
    let descriptor = mesh.catalog.resolve(product).await;
    finish(pb);
    let descriptor = descriptor?;

    if format.is_machine_readable() {
        return output::print_success(format, descriptor);
    }

    println!("{}", "DATA PRODUCT:".bold().underline());
    println!("{}", output::render_descriptor(&descriptor));
    Ok(())
}

pub async fn schema(
    mesh: &Mesh,
    product: &str,
    output_file: Option<&Path>,
    compact: bool,
    format: OutputFormat,
) -> Result<()> {
    let pb = spinner(format, format!("Fetching schema for '{}'...", product));
    let schema = mesh.catalog.schema_of(product).await;
    finish(pb);
    let schema = schema?;

    let json = if compact {
        serde_json::to_string(&schema)?
    } else {
        schema.to_json_pretty()?
    };

    if let Some(path) = output_file {
        fs::write(path, format!("{}\n", json))
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        tracing::info!(product, path = %path.display(), "Schema written");
    }

    if format.is_machine_readable() {
        return output::print_success(
            format,
            SchemaResult {
                product: product.to_string(),
                schema,
                written_to: output_file.map(|p| p.display().to_string()),
            },
        );
    }

    match output_file {
        Some(path) => println!(
            "{} Schema for '{}' written to {}",
            "✔".green(),
            product.bold(),
            path.display().yellow()
        ),
        None => println!("{}", json),
    }
    Ok(())
}
