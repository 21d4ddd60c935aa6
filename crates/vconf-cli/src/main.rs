//! vconf - versioned config registry
//!
//! Usage:
//!   vconf kinds               # List registered config kinds
//!   vconf tree                # Show the category tree
//!   vconf show <path>         # Show one config
//!   vconf save <path> ...     # Edit and save a config
//!   vconf new <KIND>          # Create a config of a node kind
//!   vconf export <path>       # Print a config as stored text

mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vconf_core::hierarchy::InstanceHandle;
use vconf_core::instance::RESERVED_FIELDS;
use vconf_core::kind::KindCapability;
use vconf_core::persistence::{SaveOutcome, WorkflowState};
use vconf_core::settings::{Settings, resolve_settings_path};
use vconf_core::workspace::Workspace;

use crate::interactive::{PrefilledDestination, TerminalHost};

#[derive(Parser)]
#[command(name = "vconf")]
#[command(about = "Versioned config registry", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./vconf.toml, then the user config dir)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Project root that storage roots resolve against
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered config kinds
    Kinds {
        /// Node kinds only
        #[arg(long, conflicts_with = "global")]
        node: bool,

        /// Global kinds only
        #[arg(long)]
        global: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the category tree of stored configs
    Tree {
        /// Only list configs whose category path contains TERM
        #[arg(long, value_name = "TERM")]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one config by category path
    Show {
        /// Category path, e.g. "Node Configs/Player Stats/hero-01"
        path: String,
    },

    /// Edit and save a config
    Save {
        /// Category path of the config
        path: String,

        /// Rename the config (node kinds only)
        #[arg(long)]
        id: Option<String>,

        /// Set a field; the value is parsed as JSON, else taken as a string
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Destination file, skipping the prompt
        #[arg(long)]
        to: Option<PathBuf>,

        /// Accept the suggested destination
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a config of a node kind
    New {
        /// Registered kind name, e.g. SFLevelConfig
        kind: String,

        /// Destination file, skipping the prompt
        #[arg(long)]
        to: Option<PathBuf>,

        /// Accept the suggested destination
        #[arg(short, long)]
        yes: bool,
    },

    /// Print a config exactly as it would be stored
    Export {
        /// Category path of the config
        path: String,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vconf=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut workspace = open_workspace(cli.config.as_deref(), &cli.root)?;

    match cli.command {
        Commands::Kinds {
            node,
            global,
            format,
        } => {
            let filter = match (node, global) {
                (true, _) => Some(KindCapability::Node),
                (_, true) => Some(KindCapability::Global),
                _ => None,
            };
            run_kinds(&workspace, filter, format)?;
        }
        Commands::Tree { search, format } => {
            workspace.reload();
            run_tree(&workspace, search.as_deref(), format)?;
        }
        Commands::Show { path } => {
            workspace.reload();
            run_show(&workspace, &path)?;
        }
        Commands::Save {
            path,
            id,
            set,
            to,
            yes,
        } => {
            workspace.reload();
            let mut host = TerminalHost::new(PrefilledDestination { to, yes });
            run_save(&mut workspace, &path, id, &set, &mut host)?;
        }
        Commands::New { kind, to, yes } => {
            workspace.reload();
            let kind = workspace
                .registry()
                .by_name(&kind)
                .with_context(|| format!("Unknown config kind '{kind}'"))?
                .id();
            let mut host = TerminalHost::new(PrefilledDestination { to, yes });
            let outcome = workspace.create(kind, &mut host)?;
            print_outcome(&workspace, &outcome, "Created");
        }
        Commands::Export { path } => {
            workspace.reload();
            let handle = find(&workspace, &path)?;
            let mut host = TerminalHost::new(PrefilledDestination::default());
            workspace.export(handle, &mut host)?;
        }
    }

    Ok(())
}

fn open_workspace(explicit: Option<&Path>, root: &Path) -> Result<Workspace> {
    let settings = match resolve_settings_path(explicit, root) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading settings");
            Settings::load(&path)?
        }
        None => Settings::default(),
    };
    if settings.kinds.is_empty() {
        tracing::warn!("No config kinds registered; add [[kind]] tables to vconf.toml");
    }
    settings.workspace(root)
}

fn find(workspace: &Workspace, path: &str) -> Result<InstanceHandle> {
    workspace
        .find(path)
        .with_context(|| format!("No config at '{path}'"))
}

fn run_kinds(
    workspace: &Workspace,
    filter: Option<KindCapability>,
    format: OutputFormat,
) -> Result<()> {
    let kinds = workspace.registry().all_kinds(filter);

    if matches!(format, OutputFormat::Json) {
        let output: Vec<Value> = kinds
            .iter()
            .map(|kind| {
                serde_json::json!({
                    "name": kind.name(),
                    "capability": kind.capability(),
                    "category": workspace.namer().kind_path(kind).to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if kinds.is_empty() {
        println!("No config kinds registered.");
        return Ok(());
    }

    println!("{:<32} {:<10} Category", "Name", "Capability");
    println!("{}", "-".repeat(70));
    for kind in kinds {
        println!(
            "{:<32} {:<10} {}",
            kind.name(),
            kind.capability().to_string(),
            workspace.namer().kind_path(kind)
        );
    }
    Ok(())
}

fn run_tree(workspace: &Workspace, search: Option<&str>, format: OutputFormat) -> Result<()> {
    let Some(tree) = workspace.tree() else {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Table => println!("No configs found."),
        }
        return Ok(());
    };

    let leaves = match search {
        Some(term) => tree.search(term),
        None => tree.leaves(),
    };

    if matches!(format, OutputFormat::Json) {
        let output: Vec<Value> = leaves
            .iter()
            .map(|(category, handle)| {
                serde_json::json!({
                    "category": category.to_string(),
                    "path": workspace.current_path(*handle).map(|p| p.display().to_string()),
                    "version": workspace.instance(*handle).map(|i| i.version()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if search.is_some() {
        if leaves.is_empty() {
            println!("No matching configs.");
        }
        for (category, _) in &leaves {
            println!("{category}");
        }
    } else if tree.is_empty() {
        println!("No configs found.");
    } else {
        for line in tree.outline() {
            println!("{line}");
        }
    }

    if let Some(hierarchy) = workspace.session().hierarchy() {
        if hierarchy.skipped > 0 {
            println!();
            println!(
                "{} {} file(s) could not be read",
                style("⚠").yellow(),
                hierarchy.skipped
            );
        }
        for category in &hierarchy.collisions {
            println!(
                "{} Several configs share '{}'",
                style("⚠").yellow(),
                category
            );
        }
    }
    Ok(())
}

fn run_show(workspace: &Workspace, path: &str) -> Result<()> {
    let handle = find(workspace, path)?;
    let summary = workspace.describe(handle)?;
    let instance = workspace
        .instance(handle)
        .context("Config disappeared during lookup")?;

    println!("{}", style(&summary.title).bold().cyan());
    println!("  Kind:     {}", summary.kind_name);
    println!("  Category: {}", summary.category);
    println!("  File:     {}", summary.path.display());
    println!("  {}", summary.version_label);
    println!();
    println!("{}", serde_json::to_string_pretty(instance.fields())?);
    Ok(())
}

fn run_save(
    workspace: &mut Workspace,
    path: &str,
    id: Option<String>,
    assignments: &[String],
    host: &mut TerminalHost,
) -> Result<()> {
    let handle = find(workspace, path)?;
    let instance = workspace.edit(handle)?;

    if let Some(id) = id {
        instance.set_id(id)?;
    }
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        instance.fields_mut().insert(key, value);
    }

    let outcome = workspace.save(handle, host)?;
    print_outcome(workspace, &outcome, "Saved");
    Ok(())
}

/// Split `key=value`; the value is JSON when it parses, else a string.
fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    anyhow::ensure!(!key.is_empty(), "Empty field name in '{raw}'");
    anyhow::ensure!(
        !RESERVED_FIELDS.contains(&key),
        "'{key}' is managed by vconf"
    );

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_outcome(workspace: &Workspace, outcome: &SaveOutcome, verb: &str) {
    match (outcome.state, &outcome.destination) {
        (WorkflowState::Done, Some(destination)) => {
            println!(
                "{} {} {}",
                style("✓").green(),
                verb,
                style(destination.display()).bold()
            );
            if let Some(summary) = outcome.selected.and_then(|h| workspace.describe(h).ok()) {
                println!("  {}", summary.category);
                println!("  {}", summary.version_label);
            }
        }
        _ => println!("Cancelled, nothing written."),
    }
}
