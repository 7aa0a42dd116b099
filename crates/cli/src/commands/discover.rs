//! `discover`: list data products.

use super::helpers::{finish, spinner, DiscoverResult};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use dmesh_core::Mesh;
use owo_colors::OwoColorize;

pub async fn discover(mesh: &Mesh, domain: Option<&str>, format: OutputFormat) -> Result<()> {
    let domain = domain.filter(|d| !d.is_empty());
    let pb = spinner(
        format,
        match domain {
            Some(d) => format!("Discovering data products in domain '{}'...", d),
            None => "Discovering data products...".to_string(),
        },
    );
    let products = mesh.catalog.list(domain).await;
    finish(pb);
    let products = products?;

    if format.is_machine_readable() {
        return output::print_success(
            format,
            DiscoverResult {
                domain: domain.map(str::to_string),
                products: products.iter().map(ToString::to_string).collect(),
            },
        );
    }

    if products.is_empty() {
        println!("{}", "No data products found.".yellow());
        return Ok(());
    }

    let width = products
        .iter()
        .map(|p| p.domain().len())
        .max()
        .unwrap_or(0)
        .max("DOMAIN".len());

    println!("{}", "DATA PRODUCTS:".bold().underline());
    println!("{:<width$}  {}", "DOMAIN".bold(), "PRODUCT".bold(), width = width);
    println!("{}", "-".repeat(width + 2 + 20).dimmed());
    for product in &products {
        println!("{:<width$}  {}", product.domain(), product.product(), width = width);
    }
    println!(
        "\n{} data product(s). Use 'dmesh info <domain.product>' for details.",
        products.len()
    );
    Ok(())
}
