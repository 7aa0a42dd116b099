use super::sanitize::{quote_identifier, quote_literal, SanitizeError};
use crate::name::ProductName;
use std::fmt;

/// Table function used to expose a physical location as a view.
///
/// Chosen from the location path alone. Catalog-declared formats can be
/// stale, so the path wins; a location that mentions neither table format
/// is read as a batch of parquet files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Iceberg,
    Delta,
    ParquetFiles,
}

impl ScanKind {
    pub fn detect(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.contains("iceberg") {
            ScanKind::Iceberg
        } else if lower.contains("delta") {
            ScanKind::Delta
        } else {
            ScanKind::ParquetFiles
        }
    }

    /// Engine extension that provides the scan function, if any.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ScanKind::Iceberg => Some("iceberg"),
            ScanKind::Delta => Some("delta"),
            ScanKind::ParquetFiles => None,
        }
    }

    fn scan_expr(&self, location: &str) -> Result<String, SanitizeError> {
        Ok(match self {
            ScanKind::Iceberg => format!("iceberg_scan({})", quote_literal(location)?),
            ScanKind::Delta => format!("delta_scan({})", quote_literal(location)?),
            ScanKind::ParquetFiles => {
                let glob = if location.ends_with(".parquet") {
                    location.to_string()
                } else {
                    format!("{}/*.parquet", location.trim_end_matches('/'))
                };
                format!("parquet_scan({})", quote_literal(&glob)?)
            }
        })
    }
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanKind::Iceberg => "iceberg_scan",
            ScanKind::Delta => "delta_scan",
            ScanKind::ParquetFiles => "parquet_scan",
        };
        f.write_str(s)
    }
}

/// `CREATE SCHEMA` and `CREATE VIEW` statements registering `name` over `location`.
pub fn registration_sql(
    name: &ProductName,
    location: &str,
    kind: ScanKind,
) -> Result<Vec<String>, SanitizeError> {
    let schema = quote_identifier(name.domain())?;
    let view = quote_identifier(name.product())?;
    Ok(vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", schema),
        format!(
            "CREATE VIEW {}.{} AS SELECT * FROM {}",
            schema,
            view,
            kind.scan_expr(location)?
        ),
    ])
}
