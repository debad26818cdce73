// ⚙️ Configuration - CLI flags, environment, logging
// Resolved once in main, then passed down as a plain Config

use crate::engine::FilterSession;
use crate::export::DEFAULT_EXPORT_FILE;
use crate::facets::{Facet, FilterState, YearRange};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_VEHICLES_FILE: &str = "vehicules.csv";
pub const DEFAULT_MAINT_TYPES_FILE: &str = "maintenance_types.csv";

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "maint-assign", version)]
#[command(about = "Filter a vehicle catalog and build maintenance assignment rules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Vehicle catalog CSV
    #[arg(long, global = true, env = "MAINT_VEHICLES_CSV", default_value = DEFAULT_VEHICLES_FILE)]
    pub vehicles: PathBuf,

    /// Maintenance types CSV
    #[arg(long, global = true, env = "MAINT_TYPES_CSV", default_value = DEFAULT_MAINT_TYPES_FILE)]
    pub maint_types: PathBuf,

    /// Where the assignment export is written
    #[arg(short, long, global = true, env = "MAINT_EXPORT_CSV", default_value = DEFAULT_EXPORT_FILE)]
    pub output: PathBuf,

    /// Write logs to this file instead of stderr (use with the TUI)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive filter and rule builder (default)
    Tui,
    /// Print availability and matches for a selection as JSON
    Facets(FacetArgs),
}

/// Selection given on the command line. Repeat a flag to select several values.
#[derive(Args, Debug, Clone, Default)]
pub struct FacetArgs {
    #[arg(long)]
    pub make: Vec<String>,
    #[arg(long)]
    pub model: Vec<String>,
    #[arg(long)]
    pub engine: Vec<String>,
    #[arg(long)]
    pub trans: Vec<String>,
    #[arg(long)]
    pub propul: Vec<String>,
    #[arg(long)]
    pub fuel: Vec<String>,
    #[arg(long)]
    pub year_from: Option<i32>,
    #[arg(long)]
    pub year_to: Option<i32>,

    /// How many matching vehicles to include
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl FacetArgs {
    fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Make => &self.make,
            Facet::Model => &self.model,
            Facet::Engine => &self.engine,
            Facet::Transmission => &self.trans,
            Facet::Drivetrain => &self.propul,
            Facet::Fuel => &self.fuel,
        }
    }

    /// The requested state, before pruning
    pub fn to_state(&self) -> FilterState {
        let mut state = FilterState {
            years: YearRange::new(self.year_from, self.year_to),
            ..Default::default()
        };
        for facet in Facet::ALL {
            state.selection.replace(facet, self.values(facet).iter().cloned());
        }
        state
    }

    /// Apply everything in one recompute
    pub fn apply(&self, session: &mut FilterSession) {
        session.set_state(self.to_state());
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub vehicles_path: PathBuf,
    pub maint_types_path: PathBuf,
    pub output_path: PathBuf,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config {
            vehicles_path: cli.vehicles.clone(),
            maint_types_path: cli.maint_types.clone(),
            output_path: cli.output.clone(),
            log_file: cli.log_file.clone(),
            verbose: cli.verbose,
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// RUST_LOG wins; otherwise warn, or debug with --verbose
pub fn init_logging(config: &Config) -> Result<()> {
    let default_level = if config.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

// ============================================================================
// TESTS
// ============================================================================
