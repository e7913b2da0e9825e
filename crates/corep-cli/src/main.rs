//! COREP CLI - operator front-end for the reporting core
//!
//! # Commands
//!
//! - `corep templates` - list registered templates
//! - `corep validate --template <id> --payload <file>` - validate a payload file
//! - `corep run --scenario <file>` - run a full reporting session
//! - `corep verify-audit <file>` - check a persisted audit log

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// COREP regulatory reporting assistant
#[derive(Parser)]
#[command(name = "corep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Extra template definition files (YAML or JSON)
    #[arg(short = 'T', long = "template-file", global = true)]
    template_files: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered templates
    Templates {
        /// Print fields and master rules as well
        #[arg(short, long)]
        detailed: bool,
    },

    /// Validate a JSON payload file against a template
    Validate {
        /// Template id
        #[arg(short, long)]
        template: String,

        /// Payload file: a JSON object of field values
        #[arg(short, long)]
        payload: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a reporting session over a JSON scenario
    Run {
        /// Session configuration (TOML)
        #[arg(short, long, conflicts_with = "template")]
        config: Option<PathBuf>,

        /// Template id, when no configuration file is given
        #[arg(short, long)]
        template: Option<String>,

        /// Scenario file: a JSON object of known values
        #[arg(short, long)]
        scenario: PathBuf,

        /// Question passed to the mapper
        #[arg(short, long, default_value = "Populate the template from the scenario")]
        question: String,

        /// Write the audit log here
        #[arg(long)]
        audit_out: Option<PathBuf>,

        /// Write the report bundle here
        #[arg(long)]
        bundle_out: Option<PathBuf>,
    },

    /// Verify the sequence and hash chain of a persisted audit log
    VerifyAudit {
        /// Audit log file
        path: PathBuf,

        /// Number of most used references to list
        #[arg(long, default_value = "5")]
        top: usize,
    },
}

fn init_tracing(json: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs, &cli.log_level);

    let outcome = match cli.command {
        Commands::Templates { detailed } => commands::templates::run(&cli.template_files, detailed),
        Commands::Validate { template, payload, json } => {
            commands::validate::run(&cli.template_files, &template, &payload, json)
        }
        Commands::Run {
            config,
            template,
            scenario,
            question,
            audit_out,
            bundle_out,
        } => commands::session::run(&commands::session::RunArgs {
            template_files: &cli.template_files,
            config: config.as_deref(),
            template: template.as_deref(),
            scenario: &scenario,
            question: &question,
            audit_out: audit_out.as_deref(),
            bundle_out: bundle_out.as_deref(),
        }),
        Commands::VerifyAudit { path, top } => commands::verify::run(&path, top),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
