// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use maint_assign::config::{init_logging, Cli, Command, Config, FacetArgs};
use maint_assign::{
    Availability, Catalog, FilterSession, FilterState, MaintenanceCatalog, VehicleRecord,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from(&cli);
    init_logging(&config)?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Facets(args) => run_facets(&config, &args)?,
        Command::Tui => run_ui_mode(&config)?,
    }

    Ok(())
}

/// Both catalogs must load before any filtering is offered
fn load_catalogs(config: &Config) -> Result<(Catalog, MaintenanceCatalog)> {
    let catalog = Catalog::load(&config.vehicles_path)
        .context("Failed to load vehicle catalog")?;
    let maintenance = MaintenanceCatalog::load(&config.maint_types_path)
        .context("Failed to load maintenance types")?;

    Ok((catalog, maintenance))
}

#[derive(Serialize)]
struct FacetReport<'a> {
    state: &'a FilterState,
    availability: &'a Availability,
    match_count: usize,
    matched: Vec<&'a VehicleRecord>,
}

fn run_facets(config: &Config, args: &FacetArgs) -> Result<()> {
    let (catalog, _maintenance) = load_catalogs(config)?;

    let mut session = FilterSession::new(catalog);
    args.apply(&mut session);

    let report = FacetReport {
        state: session.state(),
        availability: session.availability(),
        match_count: session.match_count(),
        matched: session.matched().take(args.limit).collect(),
    };

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🔧 Loading Maintenance Assignment Builder...\n");

    println!("📂 Loading CSV...");
    let (catalog, maintenance) = load_catalogs(config)?;
    let years = catalog.years();
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => {
            println!("✓ Loaded {} vehicles ({} model years, {}–{})", catalog.len(), years.len(), first, last)
        }
        _ => println!("✓ Loaded {} vehicles", catalog.len()),
    }
    println!("✓ Loaded {} maintenance types\n", maintenance.len());

    println!("Starting UI... (Press 'q' to quit)\n");

    let session = FilterSession::new(catalog);
    let mut app = ui::App::new(session, maintenance, config.output_path.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed - {} rule(s) in session", app.rules.len());

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or query facets: maint-assign facets --make <MAKE>");
    std::process::exit(1);
}
