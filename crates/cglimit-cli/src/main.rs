use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use cglimit_core::config::DEFAULT_CONFIG_PATH;
use cglimit_core::{Config, ControlCatalog, Resolver, Subject, SubjectResolver, VERSION};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod report;

/// Exit code for usage and configuration problems
const EXIT_USAGE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "cglimit")]
#[command(version = VERSION)]
#[command(about = "Show the effective cgroup limit of a process or cgroup", long_about = None)]
struct Cli {
    /// Control file to resolve, e.g. memory.max
    #[arg(required_unless_present_any = ["list", "completions"])]
    control: Option<String>,

    /// Process id, or cgroup path relative to (or under) the mount point
    #[arg(required_unless_present_any = ["list", "completions"])]
    subject: Option<String>,

    /// Show every hierarchy level visited
    #[arg(short, long)]
    verbose: bool,

    /// Print the full resolution as JSON
    #[arg(long, conflicts_with = "verbose")]
    json: bool,

    /// List supported controls
    #[arg(short, long, conflicts_with_all = ["control", "subject"])]
    list: bool,

    /// Print a shell completion script
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Path to configuration file
    #[arg(short, long, env = "CGLIMIT_CONFIG")]
    config: Option<PathBuf>,

    /// Root of the proc filesystem
    #[arg(long, env = "CGLIMIT_PROC_ROOT")]
    proc_root: Option<PathBuf>,

    /// Mount table in /proc/mounts format
    #[arg(long, env = "CGLIMIT_MOUNT_TABLE")]
    mount_table: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "cglimit", &mut io::stdout());
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(EXIT_USAGE);
        }
    };

    if let Err(e) = init_logging(&config.logging.level) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(EXIT_USAGE);
    }

    let catalog = ControlCatalog::builtin();

    if cli.list {
        print!("{}", report::render_list(&catalog));
        return;
    }

    // clap guarantees both are present unless --list/--completions was given
    let (Some(control), Some(subject)) = (cli.control.as_deref(), cli.subject.as_deref()) else {
        std::process::exit(EXIT_USAGE);
    };

    let resolver = Resolver::new(catalog, SubjectResolver::from_config(&config.paths));
    std::process::exit(resolve(&resolver, control, subject, cli.verbose, cli.json));
}

/// Resolve and print; returns the process exit code
fn resolve(resolver: &Resolver, control: &str, subject: &str, verbose: bool, json: bool) -> i32 {
    let subject = Subject::parse(subject);

    match resolver.resolve(control, &subject) {
        Ok(resolution) => {
            if json {
                match serde_json::to_string_pretty(&resolution) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("{} {}", "error:".red().bold(), e);
                        return EXIT_USAGE;
                    }
                }
                return 0;
            }

            if verbose {
                print!("{}", report::render_verbose(&resolution));
            }
            if let Some(value) = resolution.rendered() {
                println!("{}", value);
            }
            0
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    }
}

/// Load configuration: explicit file, else the default file if present, else defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None if PathBuf::from(DEFAULT_CONFIG_PATH).exists() => {
            Config::load_from_file(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load configuration file {}", DEFAULT_CONFIG_PATH))?
        }
        None => Config::default(),
    };

    if let Some(proc_root) = &cli.proc_root {
        config.paths.proc_root = proc_root.clone();
    }
    if let Some(mount_table) = &cli.mount_table {
        config.paths.mount_table = mount_table.clone();
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Initialize logging to stderr so stdout only carries results
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal())
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized");
    Ok(())
}
