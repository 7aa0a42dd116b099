//! Structured output handling for CLI commands.

use chrono::{DateTime, Utc};
use dmesh_core::federation::Cell;
use dmesh_core::{DataProductDescriptor, QueryResult};
use dmesh_error::MeshError;
use serde::Serialize;

/// Display layout for descriptor timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq, Copy)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
    /// Tabular results only (`query`).
    Csv,
}

impl OutputFormat {
    /// Returns true if the output format is intended for machine consumption
    pub fn is_machine_readable(&self) -> bool {
        match self {
            OutputFormat::Human => false,
            OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Csv => true,
        }
    }

    /// Format used for structured envelopes; CSV has none, so it falls back to JSON.
    fn envelope(&self) -> OutputFormat {
        match self {
            OutputFormat::Csv => OutputFormat::Json,
            other => *other,
        }
    }
}

/// Helper struct for JSON output responses
#[derive(Serialize)]
pub struct CommandResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> CommandResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            exit_code: Some(0),
            data,
        }
    }

    pub fn error(message: String, exit_code: i32, data: T) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            exit_code: Some(exit_code),
            data,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

pub fn render<T: Serialize>(format: OutputFormat, data: &T) -> anyhow::Result<String> {
    Ok(match format.envelope() {
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

/// Print the output to stdout in the requested format
pub fn print_output<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        // Human output is printed by the command itself.
        return Ok(());
    }
    println!("{}", render(format, &data)?);
    Ok(())
}

/// Print a structured success response for machine outputs
pub fn print_success<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }

    let response = CommandResponse::success(data);
    print_output(format, response)
}

/// Print a structured error response for machine outputs
pub fn print_error(format: OutputFormat, error: &MeshError, exit_code: i32) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        // Human error printing is handled by main
        return Ok(());
    }

    let response = CommandResponse::error(
        error.message.clone(),
        exit_code,
        ErrorData {
            code: error.code.as_str(),
            hint: error.hint.clone(),
        },
    );
    print_output(format, response)
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Key/value block describing one data product.
pub fn render_descriptor(d: &DataProductDescriptor) -> String {
    let mut lines = vec![
        format!("{:<13}{}", "Name:", d.qualified_name),
        format!("{:<13}{}", "Domain:", d.domain),
        format!("{:<13}{}", "Description:", or_dash(&d.description)),
        format!("{:<13}{}", "Type:", or_dash(&d.product_type)),
        format!("{:<13}{}", "Format:", d.format),
        format!("{:<13}{}", "Location:", or_dash(&d.location)),
        format!("{:<13}{}", "Owner:", or_dash(&d.owner)),
        format!("{:<13}{}", "Created:", format_timestamp(d.created_at)),
        format!("{:<13}{}", "Updated:", format_timestamp(d.updated_at)),
    ];

    if d.tags.is_empty() {
        lines.push(format!("{:<13}-", "Tags:"));
    } else {
        lines.push("Tags:".to_string());
        let mut tags: Vec<_> = d.tags.iter().collect();
        tags.sort();
        for (key, value) in tags {
            lines.push(format!("  {} = {}", key, value));
        }
    }
    lines.join("\n")
}

/// Aligned text table with a row-count footer.
pub fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(no columns)".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    output.push_str(&line(&result.columns));
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    output.push('\n');
    for row in &cells {
        output.push_str(&line(row));
        output.push('\n');
    }

    let count = result.row_count();
    output.push_str(&format!("({} {})", count, if count == 1 { "row" } else { "rows" }));
    output
}

fn csv_value(cell: &Cell) -> String {
    if cell.is_null() {
        return String::new();
    }
    let s = cell.to_string();
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s
    }
}

/// Header line plus one line per row. NULL renders as an empty field.
pub fn render_csv(result: &QueryResult) -> String {
    let header: Vec<String> = result
        .columns
        .iter()
        .map(|c| csv_value(&Cell::Text(c.clone())))
        .collect();

    let mut output = header.join(",");
    output.push('\n');
    for row in &result.rows {
        let values: Vec<String> = row.iter().map(csv_value).collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }
    output
}
