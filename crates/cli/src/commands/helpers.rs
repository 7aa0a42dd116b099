//! Shared helpers and result types for CLI commands.
//!
//! Result types are the `data` payload of machine-readable responses.

use crate::output::OutputFormat;
use dmesh_core::catalog::SchemaDocument;
use dmesh_core::credentials::SourceKind;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Spinner on stderr for human output; `None` for machine formats.
pub fn spinner(format: OutputFormat, message: impl Into<String>) -> Option<ProgressBar> {
    if format.is_machine_readable() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

// ===== Result Types =====

#[derive(Serialize)]
pub struct DiscoverResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub products: Vec<String>,
}

#[derive(Serialize)]
pub struct SchemaResult {
    pub product: String,
    pub schema: SchemaDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
}

#[derive(Serialize)]
pub struct QueryOutput {
    pub product: String,
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
}

#[derive(Serialize)]
pub struct WhoamiResult {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub credential_source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub caller_arn: String,
}
