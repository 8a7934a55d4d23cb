//! kiln command-line tool
//!
//! Drives the pre-analysis steps of a native image build: opens the layered
//! classpath, runs the initialization trigger sequence once, then analyzes
//! roots in parallel. Also exposes the classpath for inspection.

mod commands;
mod config;
mod home;

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

use commands::build::BuildOptions;
use commands::Context;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Classpath resolution and initialization sequencing for native image builds", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./kiln.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra classpath entries, searched before the configured ones
    #[arg(long, visible_alias = "cp", global = true)]
    classpath: Option<OsString>,

    /// Verbose logging (KILN_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize trigger clusters, then analyze roots in parallel
    Build {
        /// Analysis roots (replaces analysis.roots)
        roots: Vec<String>,
        /// Fail when a dependency cycle has no trigger
        #[arg(long)]
        strict: bool,
        /// Analysis worker threads
        #[arg(short = 'j', long)]
        workers: Option<usize>,
    },

    /// Print the locator a resource resolves to
    Locate {
        /// Resource name (e.g. "x/Y.class")
        name: String,
    },

    /// Write a resource to stdout
    Cat {
        /// Resource name
        name: String,
    },

    /// List classpath entries and the archive index
    List,

    /// Print the runtime home directory
    Home,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let ctx = Context::load(cli.config.as_deref(), cli.classpath.as_deref())?;

    match cli.command {
        Commands::Build {
            roots,
            strict,
            workers,
        } => commands::build::execute(
            &ctx,
            BuildOptions {
                strict,
                roots,
                workers,
            },
        ),
        Commands::Locate { name } => commands::inspect::locate(&ctx, &name),
        Commands::Cat { name } => commands::inspect::cat(&ctx, &name),
        Commands::List => commands::inspect::list(&ctx),
        Commands::Home => commands::inspect::home(&ctx),
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("KILN_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
