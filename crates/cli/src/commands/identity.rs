//! `whoami`: active role and caller identity.

use super::helpers::{finish, spinner, WhoamiResult};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use dmesh_core::Mesh;
use owo_colors::OwoColorize;

pub async fn whoami(mesh: &Mesh, format: OutputFormat) -> Result<()> {
    let pb = spinner(format, "Checking caller identity...");
    let identity = async {
        let creds = mesh.credentials.current().await?;
        let caller = mesh.auditor.whoami().await?;
        Ok::<_, dmesh_core::CredentialError>((creds, caller))
    }
    .await;
    finish(pb);
    let (creds, caller) = identity?;

    let result = WhoamiResult {
        role: creds.role.name.clone(),
        account_id: creds.role.account_id.clone().or(caller.account),
        credential_source: creds.source,
        expires_at: creds.expires_at.map(|t| output::format_timestamp(Some(t))),
        caller_arn: caller.arn,
    };

    if format.is_machine_readable() {
        return output::print_success(format, result);
    }

    println!("{:<12}{}", "Role:".bold(), output::or_dash(&result.role));
    println!(
        "{:<12}{}",
        "Account:".bold(),
        result.account_id.as_deref().unwrap_or("-")
    );
    println!("{:<12}{}", "Identity:".bold(), result.caller_arn.cyan());
    println!("{:<12}{}", "Source:".bold(), result.credential_source);
    println!(
        "{:<12}{}",
        "Expires:".bold(),
        result.expires_at.as_deref().unwrap_or("-")
    );
    Ok(())
}
