// 🏷️ Assignment Rules - Rules as Data
// Snapshot the current filter + a maintenance operation into an immutable rule

use crate::facets::{Facet, FilterState};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Every rule fires if any of its intervals is reached
pub const TRIGGER_LOGIC: &str = "OR";

// ============================================================================
// VALIDATION
// ============================================================================

/// Rule creation refused; nothing was appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("choose a maintenance operation (maint_code)")]
    MissingMaintenanceCode,

    #[error("invalid value for {field}: \"{value}\"")]
    InvalidNumber { field: &'static str, value: String },
}

// ============================================================================
// RULE DRAFT
// ============================================================================

/// Form values as typed, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDraft {
    pub maint_code: String,
    pub cost: String,
    pub retail: String,
    pub first_months: String,
    pub first_km: String,
    pub repeat_months: String,
    pub repeat_km: String,
}

impl RuleDraft {
    pub fn new(maint_code: impl Into<String>) -> Self {
        RuleDraft {
            maint_code: maint_code.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: cost and retail price
    pub fn with_prices(mut self, cost: impl Into<String>, retail: impl Into<String>) -> Self {
        self.cost = cost.into();
        self.retail = retail.into();
        self
    }

    /// Builder pattern: first service due after months / km
    pub fn with_first(mut self, months: impl Into<String>, km: impl Into<String>) -> Self {
        self.first_months = months.into();
        self.first_km = km.into();
        self
    }

    /// Builder pattern: repeat service every months / km
    pub fn with_repeat(mut self, months: impl Into<String>, km: impl Into<String>) -> Self {
        self.repeat_months = months.into();
        self.repeat_km = km.into();
        self
    }

    fn numeric_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("cost", self.cost.trim()),
            ("retail", self.retail.trim()),
            ("first_months", self.first_months.trim()),
            ("first_km", self.first_km.trim()),
            ("repeat_months", self.repeat_months.trim()),
            ("repeat_km", self.repeat_km.trim()),
        ]
    }

    /// First problem found, in form order
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.maint_code.trim().is_empty() {
            return Err(ValidationError::MissingMaintenanceCode);
        }

        for (field, value) in self.numeric_fields() {
            if value.is_empty() {
                continue;
            }
            let finite = value.parse::<f64>().map(f64::is_finite).unwrap_or(false);
            if !finite {
                return Err(ValidationError::InvalidNumber {
                    field,
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// RULE
// ============================================================================

/// Immutable assignment rule. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub rule_id: u32,
    pub maint_code: String,
    pub cost: String,
    pub retail: String,
    pub make: String,
    pub model: String,
    pub year_from: String,
    pub year_to: String,
    pub engine: String,
    pub trans: String,
    pub propul: String,
    pub fuel: String,
    pub first_months: String,
    pub first_km: String,
    pub repeat_months: String,
    pub repeat_km: String,
    pub trigger_logic: String,
}

impl Rule {
    /// Snapshot a validated draft against the current filter state
    fn snapshot(rule_id: u32, draft: &RuleDraft, state: &FilterState) -> Self {
        let selection = &state.selection;

        Rule {
            rule_id,
            maint_code: draft.maint_code.trim().to_string(),
            cost: draft.cost.trim().to_string(),
            retail: draft.retail.trim().to_string(),
            make: selection.to_pipe(Facet::Make),
            model: selection.to_pipe(Facet::Model),
            year_from: state.years.from_text(),
            year_to: state.years.to_text(),
            engine: selection.to_pipe(Facet::Engine),
            trans: selection.to_pipe(Facet::Transmission),
            propul: selection.to_pipe(Facet::Drivetrain),
            fuel: selection.to_pipe(Facet::Fuel),
            first_months: draft.first_months.trim().to_string(),
            first_km: draft.first_km.trim().to_string(),
            repeat_months: draft.repeat_months.trim().to_string(),
            repeat_km: draft.repeat_km.trim().to_string(),
            trigger_logic: TRIGGER_LOGIC.to_string(),
        }
    }

    /// Pipe-joined restriction for one facet; empty means all values
    pub fn facet(&self, facet: Facet) -> &str {
        match facet {
            Facet::Make => &self.make,
            Facet::Model => &self.model,
            Facet::Engine => &self.engine,
            Facet::Transmission => &self.trans,
            Facet::Drivetrain => &self.propul,
            Facet::Fuel => &self.fuel,
        }
    }

    /// Restricted facets joined for display, or "ALL"
    pub fn scope_summary(&self) -> String {
        let parts: Vec<&str> = Facet::ALL
            .iter()
            .map(|&f| self.facet(f))
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            "ALL".to_string()
        } else {
            parts.join(" | ")
        }
    }

    pub fn year_span(&self) -> String {
        format!("{}–{}", self.year_from, self.year_to)
    }
}

// ============================================================================
// RULE BOOK
// ============================================================================

/// Append-only list of saved rules for this session.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new() -> Self {
        RuleBook { rules: Vec::new() }
    }

    /// Id the next saved rule will get: max existing id + 1, starting at 1
    pub fn next_id(&self) -> u32 {
        self.rules.iter().map(|r| r.rule_id).max().unwrap_or(0) + 1
    }

    /// Validate the draft and append a snapshot of the current filter
    pub fn add(&mut self, draft: &RuleDraft, state: &FilterState) -> Result<&Rule, ValidationError> {
        draft.validate()?;

        let rule = Rule::snapshot(self.next_id(), draft, state);
        info!(rule_id = rule.rule_id, maint_code = %rule.maint_code, scope = %rule.scope_summary(), "rule saved");

        self.rules.push(rule);
        Ok(&self.rules[self.rules.len() - 1])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
