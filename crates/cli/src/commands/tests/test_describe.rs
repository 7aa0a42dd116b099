use super::test_helpers::{sales_catalog, test_mesh};
use crate::commands::{info, schema};
use crate::output::OutputFormat;
use dmesh_core::CatalogError;
use std::fs;

#[tokio::test]
async fn test_info_json_and_human() {
    let mesh = test_mesh(sales_catalog(), false);
    assert!(info(&mesh, "sales.orders", OutputFormat::Json).await.is_ok());
    assert!(info(&mesh, "sales.orders", OutputFormat::Human).await.is_ok());
}

#[tokio::test]
async fn test_info_unknown_product_is_not_found() {
    let mesh = test_mesh(sales_catalog(), false);
    let err = info(&mesh, "sales.missing", OutputFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_schema_written_to_file() {
    let mesh = test_mesh(sales_catalog(), false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.schema.json");

    schema(&mesh, "sales.orders", Some(path.as_path()), false, OutputFormat::Human)
        .await
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["type"], "struct");
    assert_eq!(written["fields"][0]["name"], "id");
    assert_eq!(written["fields"][1]["name"], "amount");
    assert_eq!(written["fields"][1]["type"], "double");
}

#[tokio::test]
async fn test_schema_compact_is_single_line() {
    let mesh = test_mesh(sales_catalog(), false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compact.json");

    schema(&mesh, "sales.orders", Some(path.as_path()), true, OutputFormat::Json)
        .await
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim_end().lines().count(), 1);
}

#[tokio::test]
async fn test_schema_malformed_name() {
    let mesh = test_mesh(sales_catalog(), false);
    let err = schema(&mesh, "orders", None, false, OutputFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::MalformedName { .. })
    ));
}
