//! Flowtrace Studio CLI
//!
//! Rebuilds the execution graph of contact-center interactions from
//! collected flow, function and trace logs and writes it as Graphviz DOT.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use flowtrace_studio::commands::{
    display_version, execute_render, validate_args, validate_report_file, RenderArgs,
};
use flowtrace_studio::utils::config::DEFAULT_REGION;

/// Flowtrace Studio - execution graphs for contact-center interactions
#[derive(Parser, Debug)]
#[command(name = "flowtrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the graphs of an interaction and its related interactions
    Render {
        /// Directory of collected logs
        #[arg(short, long)]
        input: PathBuf,

        /// Interaction to render
        #[arg(short, long)]
        contact: String,

        /// Output directory for DOT files and the render report
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Region passed to the trace store
        #[arg(long, env = "FLOWTRACE_REGION", default_value = DEFAULT_REGION)]
        region: String,

        /// HTTP trace gateway (defaults to trace batches in the input bundle)
        #[arg(long, env = "FLOWTRACE_TRACE_ENDPOINT")]
        trace_endpoint: Option<String>,

        /// JSON file mapping module types to display names
        #[arg(long)]
        names: Option<PathBuf>,

        /// Render only the selected interaction
        #[arg(long)]
        single: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a render report file
    Validate {
        /// Path to render report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Render {
            input,
            contact,
            output,
            region,
            trace_endpoint,
            names,
            single,
            summary,
        } => {
            let args = RenderArgs {
                input,
                contact_id: contact,
                output_dir: output,
                region,
                trace_endpoint,
                names_file: names,
                single,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_render(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
