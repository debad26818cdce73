// Maintenance Assignment Builder - Core Library
// Exposes the catalog, the cascading filter engine and the rule builder
// for the CLI, the TUI and tests

pub mod catalog;  // Vehicle + maintenance type catalogs (CSV load)
pub mod facets;   // Facet dimensions, selection state, natural ordering
pub mod engine;   // Cascading availability, prune & clamp, filter session
pub mod rules;    // Rule drafts, validation, append-only rule book
pub mod export;   // Assignment CSV export
pub mod config;   // CLI flags, environment, logging

// Re-export commonly used types
pub use catalog::{
    Catalog, VehicleRecord, MaintenanceCatalog, MaintenanceType, LoadError,
    parse_year,
};
pub use facets::{
    Facet, FacetSelection, YearRange, FilterState, CollationKey, collation_key, natural_cmp,
};
pub use engine::{
    FilterSession, Availability, Scope,
    matches, matches_within, compute_availability, prune_and_clamp,
};
pub use rules::{
    Rule, RuleBook, RuleDraft, ValidationError, TRIGGER_LOGIC,
};
pub use export::{
    ASSIGNMENT_HEADER, write_assignments, export_to_path, assignments_to_string,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
