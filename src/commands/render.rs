//! Render command implementation.
//!
//! The render command:
//! 1. Opens the input bundle
//! 2. Reads the related interactions
//! 3. Assembles each interaction's flow graph and conversation artifacts
//! 4. Composes the top-level graph
//! 5. Writes DOT files
//! 6. Writes the render report

use super::models::RenderArgs;
use crate::correlator::TraceScope;
use crate::graph::{
    attribute_table, build_interaction_graph, compose, conversation_artifacts, AssemblyContext,
    InteractionOutcome,
};
use crate::label::DisplayNames;
use crate::output::{write_artifacts, write_report, ContactReport, RenderReport};
use crate::parser::{ContactSummary, InputBundle, InteractionInput};
use crate::store::{FileTraceStore, HttpTraceStore, TraceStore};
use crate::utils::config::REPORT_FILE_NAME;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the render command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Render command arguments
///
/// # Returns
/// The report that was written next to the DOT files
///
/// # Errors
/// * Missing or unreadable bundle directory or contact list
/// * Trace gateway client construction failures
/// * File write errors
///
/// An interaction whose logs cannot be loaded does not fail the render; it
/// shows up as an empty cluster and a `failed` report row.
pub fn execute_render(args: RenderArgs) -> Result<RenderReport> {
    let start_time = Instant::now();

    info!("Starting render for contact: {}", args.contact_id);
    info!("Input bundle: {}", args.input.display());

    // Step 1: Open bundle and supporting collaborators
    info!("Step 1/6: Opening input bundle...");
    let bundle = InputBundle::open(&args.input).context("Failed to open input bundle")?;
    let store = trace_store(&args, bundle.root())?;
    let names = match &args.names_file {
        Some(path) => DisplayNames::load(path).context("Failed to load display names")?,
        None => DisplayNames::default(),
    };

    // Step 2: Related interactions
    info!("Step 2/6: Reading related interactions...");
    let contacts = select_contacts(&bundle, &args)?;
    debug!("Rendering {} interaction(s)", contacts.len());

    // Step 3: Assemble each interaction
    info!("Step 3/6: Assembling interactions...");
    let outcomes: Vec<InteractionOutcome> = contacts
        .into_iter()
        .map(|summary| match bundle.load_interaction(&summary) {
            Ok(input) => assemble_interaction(&input, &args.region, &*store, &names),
            Err(e) => {
                warn!("Logs for contact {} unavailable: {}", summary.contact_id, e);
                InteractionOutcome::failed(summary)
            }
        })
        .collect();

    let rows: Vec<ContactReport> = outcomes.iter().map(report_row).collect();

    // Step 4: Compose
    info!("Step 4/6: Composing top-level graph...");
    let composition = compose(&args.contact_id, outcomes);

    // Step 5: Write DOT files
    info!("Step 5/6: Writing DOT files...");
    let written = write_artifacts(&composition.graph, &composition.artifacts, &args.output_dir)
        .context("Failed to write DOT files")?;
    info!("✓ {} DOT file(s) written to: {}", written.len(), args.output_dir.display());

    // Step 6: Write report
    info!("Step 6/6: Writing render report...");
    let report = RenderReport::new(args.contact_id.clone(), rows);
    let report_path = args.output_dir.join(REPORT_FILE_NAME);
    write_report(&report, &report_path).context("Failed to write render report")?;
    info!("✓ Report written to: {}", report_path.display());

    if args.print_summary {
        print_summary(&report);
    }

    let elapsed = start_time.elapsed();
    info!("Render completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Assemble one interaction from its loaded logs
///
/// **Public** - used by the render command and integration tests
pub fn assemble_interaction(
    input: &InteractionInput,
    region: &str,
    store: &dyn TraceStore,
    names: &DisplayNames,
) -> InteractionOutcome {
    let id = input.summary.contact_id.as_str();
    let ctx = AssemblyContext::new(id, region, &input.function_logs, store, names);
    let flow = build_interaction_graph(&ctx, &input.events);

    let scope = TraceScope {
        interaction_id: id,
        unit_stack: "",
        region,
        store,
        names,
    };
    let (link_nodes, artifacts) =
        conversation_artifacts(&scope, &input.transcript, &input.lex_turns, &input.lex_hook_logs);

    debug!(
        "Contact {}: {} node(s), {} error(s), {} conversation artifact(s)",
        id,
        flow.order.len(),
        flow.error_count,
        artifacts.len()
    );

    InteractionOutcome {
        summary: input.summary.clone(),
        flow,
        link_nodes,
        artifacts,
        attributes: attribute_table(&input.attributes, &input.events),
        failed: false,
    }
}

/// Trace store backing this render
///
/// **Private** - gateway when configured, bundle files otherwise
fn trace_store(args: &RenderArgs, bundle_root: &Path) -> Result<Box<dyn TraceStore>> {
    match &args.trace_endpoint {
        Some(endpoint) => {
            info!("Trace gateway: {}", endpoint);
            let store = HttpTraceStore::new(endpoint.as_str()).context("Failed to create trace store client")?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(FileTraceStore::new(bundle_root))),
    }
}

/// Interactions to render, in directory order
///
/// **Private** - the selected interaction is always included
fn select_contacts(bundle: &InputBundle, args: &RenderArgs) -> Result<Vec<ContactSummary>> {
    let listed = bundle.contacts().context("Failed to read contact list")?;

    let mut contacts: Vec<ContactSummary> = if args.single {
        listed
            .into_iter()
            .filter(|c| c.contact_id == args.contact_id)
            .collect()
    } else {
        listed
    };

    if !contacts.iter().any(|c| c.contact_id == args.contact_id) {
        warn!(
            "Contact {} missing from contact list; rendering it without metadata",
            args.contact_id
        );
        contacts.insert(
            0,
            ContactSummary {
                contact_id: args.contact_id.clone(),
                ..Default::default()
            },
        );
    }

    Ok(contacts)
}

fn report_row(outcome: &InteractionOutcome) -> ContactReport {
    ContactReport {
        contact_id: outcome.id().to_string(),
        channel: outcome.summary.channel.clone(),
        nodes: outcome.flow.order.len(),
        error_count: outcome.flow.error_count,
        artifacts: outcome.artifact_names(),
        failed: outcome.failed,
    }
}

fn print_summary(report: &RenderReport) {
    println!("\n{}", "=".repeat(80));
    println!("RENDER SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Selected contact: {}", report.selected_contact);
    for contact in &report.contacts {
        let status = if contact.failed { " (logs unavailable)" } else { "" };
        println!(
            "  {} [{}]: {} node(s), {} error(s), {} artifact(s){}",
            contact.contact_id,
            contact.channel,
            contact.nodes,
            contact.error_count,
            contact.artifacts.len(),
            status
        );
    }
    println!("Total errors:    {}", report.total_errors());
    println!("Total artifacts: {}", report.total_artifacts());
    println!("{}", "=".repeat(80));
}

/// Validate render arguments
///
/// **Public** - can be called before execute_render for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &RenderArgs) -> Result<()> {
    if args.contact_id.trim().is_empty() {
        anyhow::bail!("Contact id cannot be empty");
    }

    if !args.input.is_dir() {
        anyhow::bail!("Input bundle directory does not exist: {}", args.input.display());
    }

    if let Some(endpoint) = &args.trace_endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            anyhow::bail!("Trace endpoint must start with http:// or https://");
        }
    }

    if args.region.trim().is_empty() {
        anyhow::bail!("Region cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn valid_args(dir: &Path) -> RenderArgs {
        RenderArgs {
            input: dir.to_path_buf(),
            contact_id: "c-1".to_string(),
            ..Default::default()
        }
    }

    fn write(dir: &Path, name: &str, value: Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_validate_args_valid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_args(&valid_args(dir.path())).is_ok());
    }

    #[test]
    fn test_validate_args_empty_contact() {
        let dir = tempfile::tempdir().unwrap();
        let args = RenderArgs {
            contact_id: "  ".to_string(),
            ..valid_args(dir.path())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let args = RenderArgs {
            input: "/definitely/not/here".into(),
            contact_id: "c-1".to_string(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_endpoint_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let args = RenderArgs {
            trace_endpoint: Some("ftp://gateway".to_string()),
            ..valid_args(dir.path())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_region() {
        let dir = tempfile::tempdir().unwrap();
        let args = RenderArgs {
            region: String::new(),
            ..valid_args(dir.path())
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_select_contacts_single_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contacts.json",
            json!({"ContactSummaryList": [
                {"ContactId": "c-0", "InitiationMethod": "INBOUND", "Channel": "VOICE"},
                {"ContactId": "c-1", "PreviousContactId": "c-0", "InitiationMethod": "TRANSFER", "Channel": "VOICE"}
            ]}),
        );
        let bundle = InputBundle::open(dir.path()).unwrap();

        let all = select_contacts(&bundle, &valid_args(dir.path())).unwrap();
        assert_eq!(all.len(), 2);

        let single = RenderArgs {
            single: true,
            ..valid_args(dir.path())
        };
        let only = select_contacts(&bundle, &single).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].contact_id, "c-1");

        let unknown = RenderArgs {
            contact_id: "c-9".to_string(),
            ..valid_args(dir.path())
        };
        let with_missing = select_contacts(&bundle, &unknown).unwrap();
        assert_eq!(with_missing.len(), 3);
        assert_eq!(with_missing[0].contact_id, "c-9");
    }

    #[test]
    fn test_execute_render_marks_unloadable_contact_failed() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contacts.json",
            json!({"ContactSummaryList": [
                {"ContactId": "c-1", "InitiationMethod": "INBOUND", "Channel": "VOICE"},
                {"ContactId": "c-2", "PreviousContactId": "c-1", "InitiationMethod": "TRANSFER", "Channel": "VOICE"}
            ]}),
        );
        write(
            dir.path(),
            "contact_flow_c-1.json",
            json!([
                {"Timestamp": "2024-05-01T01:02:03Z", "ContactId": "c-1",
                 "ContactFlowName": "Main", "ContactFlowModuleType": "PlayPrompt",
                 "Parameters": {"Text": "Hello"}},
                {"Timestamp": "2024-05-01T01:02:04Z", "ContactId": "c-1",
                 "ContactFlowName": "Main", "ContactFlowModuleType": "Disconnect"}
            ]),
        );

        let args = RenderArgs {
            output_dir: out.path().to_path_buf(),
            ..valid_args(dir.path())
        };
        let report = execute_render(args).unwrap();

        assert_eq!(report.contacts.len(), 2);
        assert!(!report.contacts[0].failed);
        assert_eq!(report.contacts[0].nodes, 1);
        assert!(report.contacts[1].failed);
        assert!(out.path().join("contact_flow.dot").exists());
        assert!(out.path().join(REPORT_FILE_NAME).exists());
    }
}
