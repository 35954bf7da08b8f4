use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a render report file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path).context("Failed to read render report")?;

    println!("✓ Valid render report");
    println!("  Version: {}", report.version);
    println!("  Selected contact: {}", report.selected_contact);
    println!("  Contacts: {}", report.contacts.len());
    println!("  Failed contacts: {}", report.contacts.iter().filter(|c| c.failed).count());
    println!("  Total errors: {}", report.total_errors());
    println!("  Artifacts: {}", report.total_artifacts());
    println!("  Generated at: {}", report.generated_at);

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Flowtrace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Render Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Execution graph reconstruction for contact-center interactions.");
}
