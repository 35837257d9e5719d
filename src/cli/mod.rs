//! # telegrafctl
//!
//! Operator command-line tool for the Telegraf Sidecar Controller.
//!
//! Runs the controller's own class loading, annotation and assembly code offline, so
//! class files and pod annotations can be checked before they reach a cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Validate every class file in a directory
//! telegrafctl validate-classes /etc/config/classes
//!
//! # Render the sidecar and configuration a pod manifest would receive
//! telegrafctl render --classes-dir /etc/config/classes --pod pod.yaml
//!
//! # Use a different default class and enable the internal plugin
//! telegrafctl render --classes-dir ./classes --pod pod.yaml --default-class infra --enable-internal
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod render;
mod validate;

/// Telegraf Sidecar Controller CLI
#[derive(Parser)]
#[command(name = "telegrafctl")]
#[command(
    about = "Telegraf Sidecar Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  telegrafctl validate-classes ./classes
  telegrafctl render --classes-dir ./classes --pod pod.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate every class file in a directory
    #[command(name = "validate-classes")]
    ValidateClasses {
        /// Directory containing one Telegraf class file per class
        #[arg(value_name = "DIR")]
        directory: PathBuf,
    },
    /// Print the sidecar container and Telegraf configuration for a pod manifest
    Render {
        /// Directory containing one Telegraf class file per class
        #[arg(long, value_name = "DIR")]
        classes_dir: PathBuf,

        /// Pod manifest (YAML or JSON)
        #[arg(long, value_name = "FILE")]
        pod: PathBuf,

        /// Class used when the pod does not select one
        #[arg(long, default_value = telegraf_sidecar_controller::constants::DEFAULT_CLASS_NAME)]
        default_class: String,

        /// Add the Telegraf internal input plugin
        #[arg(long)]
        enable_internal: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegrafctl=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateClasses { directory } => validate::validate_classes_command(&directory),
        Commands::Render {
            classes_dir,
            pod,
            default_class,
            enable_internal,
        } => render::render_command(&classes_dir, &pod, &default_class, enable_internal),
    }
}
