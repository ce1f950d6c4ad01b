// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Facility registry CLI - facility hierarchy and layout identifiers

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use facility_registry::commands::{self, facility, Ctx};
use facility_registry::config;
use facility_registry::types::{FacilityLevel, FacilityType};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facility-registry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "FACILITY_REGISTRY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "FACILITY_REGISTRY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a facility
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Facility type (warehouse, storage, ...)
        #[arg(long = "type", value_parser = parse_type)]
        facility_type: FacilityType,

        /// Level (organization, building, floor, zone, location)
        #[arg(long)]
        level: FacilityLevel,

        /// Parent facility id
        #[arg(long)]
        parent: Option<String>,

        /// Explicit facility id
        #[arg(long)]
        id: Option<String>,

        /// Property as key=value (repeatable)
        #[arg(long = "prop", value_parser = facility::parse_property)]
        props: Vec<(String, Value)>,
    },

    /// List facilities
    List {
        /// Only this level
        #[arg(long)]
        level: Option<FacilityLevel>,

        /// Only this type
        #[arg(long = "type", value_parser = parse_type)]
        facility_type: Option<FacilityType>,
    },

    /// Show one facility
    Show {
        /// Facility id
        id: String,
    },

    /// Update a facility's name, type or properties
    Update {
        /// Facility id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New facility type
        #[arg(long = "type", value_parser = parse_type)]
        facility_type: Option<FacilityType>,

        /// Property as key=value (repeatable)
        #[arg(long = "prop", value_parser = facility::parse_property)]
        props: Vec<(String, Value)>,
    },

    /// Delete a facility and everything under it
    Delete {
        /// Facility id
        id: String,
    },

    /// Search facilities by name or location code
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// Facility counts by level and type
    Stats,

    /// Export the facility tree
    Export {
        /// Output format (json, dot, tree)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the facility tree with an exported snapshot
    Import {
        /// Snapshot file
        file: PathBuf,
    },

    /// Inspect location identifiers in a layout document
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },

    /// Show resolved settings
    Config {
        /// Setting to print (all settings if omitted)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum LayoutAction {
    /// Count identifiers and report duplicates
    Scan {
        /// Layout JSON file
        file: PathBuf,
    },

    /// Check whether identifiers are free
    Check {
        /// Layout JSON file
        file: PathBuf,

        /// Identifiers to check
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn parse_type(s: &str) -> Result<FacilityType, String> {
    s.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    // Initialize logging: -v/-q win, then RUST_LOG, then the configured level
    let filter = match cli.verbose {
        0 if cli.quiet => EnvFilter::new("error"),
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        settings,
        json: cli.json,
        color: !cli.no_color && !cli.json,
    };

    match cli.command {
        Commands::Create { name, facility_type, level, parent, id, props } => facility::create(
            &ctx,
            facility::CreateArgs { name, facility_type, level, parent, id, props },
        ),
        Commands::List { level, facility_type } => facility::list(&ctx, level, facility_type),
        Commands::Show { id } => facility::show(&ctx, &id),
        Commands::Update { id, name, facility_type, props } => {
            facility::update(&ctx, &id, facility::UpdateArgs { name, facility_type, props })
        }
        Commands::Delete { id } => facility::delete(&ctx, &id),
        Commands::Search { query } => facility::search(&ctx, &query),
        Commands::Stats => commands::stats::run(&ctx),
        Commands::Export { format, output } => commands::export::run(&ctx, &format, output),
        Commands::Import { file } => commands::import::run(&ctx, &file),
        Commands::Layout { action } => match action {
            LayoutAction::Scan { file } => commands::layout::scan(&ctx, &file),
            LayoutAction::Check { file, ids } => commands::layout::check(&ctx, &file, &ids),
        },
        Commands::Config { key } => commands::config::run(&ctx, key.as_deref()),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
