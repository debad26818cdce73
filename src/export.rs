// 📤 Assignment Export - Rule list → CSV
// Fixed header, one row per rule in insertion order

use crate::rules::Rule;
use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Export columns, in order. Matches the field order of `Rule`.
pub const ASSIGNMENT_HEADER: [&str; 17] = [
    "rule_id",
    "maint_code",
    "cost",
    "retail",
    "make",
    "model",
    "year_from",
    "year_to",
    "engine",
    "trans",
    "propul",
    "fuel",
    "first_months",
    "first_km",
    "repeat_months",
    "repeat_km",
    "trigger_logic",
];

/// Default output file name
pub const DEFAULT_EXPORT_FILE: &str = "assignments_export.csv";

/// Write the header and every rule. The header is written even with no rules.
pub fn write_assignments<W: Write>(rules: &[Rule], out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    wtr.write_record(ASSIGNMENT_HEADER)
        .context("Failed to write export header")?;

    for rule in rules {
        wtr.serialize(rule)
            .with_context(|| format!("Failed to write rule {}", rule.rule_id))?;
    }

    wtr.flush().context("Failed to flush export")?;
    Ok(())
}

/// Export to a file, replacing it. Returns the number of rules written.
pub fn export_to_path<P: AsRef<Path>>(rules: &[Rule], path: P) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {:?}", path))?;

    write_assignments(rules, file)?;
    info!(path = %path.display(), rules = rules.len(), "assignments exported");

    Ok(rules.len())
}

/// Render the export as a string
pub fn assignments_to_string(rules: &[Rule]) -> Result<String> {
    let mut buf = Vec::new();
    write_assignments(rules, &mut buf)?;
    String::from_utf8(buf).context("Export is not valid UTF-8")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::{Facet, FilterState, YearRange};
    use crate::rules::{RuleBook, RuleDraft};

    #[test]
    fn test_header_only_when_no_rules() {
        let text = assignments_to_string(&[]).unwrap();
        assert_eq!(
            text,
            "rule_id,maint_code,cost,retail,make,model,year_from,year_to,engine,trans,propul,fuel,first_months,first_km,repeat_months,repeat_km,trigger_logic\n"
        );
    }

    #[test]
    fn test_unrestricted_rule_row() {
        let state = FilterState {
            years: YearRange::new(Some(2015), Some(2024)),
            ..Default::default()
        };
        let mut book = RuleBook::new();
        book.add(&RuleDraft::new("OIL01").with_prices("49.99", ""), &state)
            .unwrap();

        let text = assignments_to_string(book.rules()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), ASSIGNMENT_HEADER.len());

        let column = |name: &str| {
            let i = ASSIGNMENT_HEADER.iter().position(|h| *h == name).unwrap();
            fields[i]
        };
        assert_eq!(column("rule_id"), "1");
        assert_eq!(column("maint_code"), "OIL01");
        assert_eq!(column("cost"), "49.99");
        for key in ["make", "model", "engine", "trans", "propul", "fuel"] {
            assert_eq!(column(key), "", "{} should be empty", key);
        }
        assert_eq!(column("year_from"), "2015");
        assert_eq!(column("year_to"), "2024");
        assert_eq!(column("trigger_logic"), "OR");
    }

    #[test]
    fn test_fields_with_special_characters_are_quoted() {
        let mut state = FilterState::default();
        state.selection.insert(Facet::Model, "F-150, \"Raptor\"");

        let mut book = RuleBook::new();
        book.add(&RuleDraft::new("OIL01"), &state).unwrap();

        let text = assignments_to_string(book.rules()).unwrap();
        assert!(text.contains(",\"F-150, \"\"Raptor\"\"\","));
    }

    #[test]
    fn test_rows_in_insertion_order() {
        let mut book = RuleBook::new();
        let state = FilterState::default();
        book.add(&RuleDraft::new("B"), &state).unwrap();
        book.add(&RuleDraft::new("A"), &state).unwrap();

        let text = assignments_to_string(book.rules()).unwrap();
        let codes: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE);

        let mut book = RuleBook::new();
        book.add(&RuleDraft::new("OIL01"), &FilterState::default()).unwrap();

        let written = export_to_path(book.rules(), &path).unwrap();
        assert_eq!(written, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("rule_id,maint_code,"));
        assert_eq!(text.lines().count(), 2);
    }
}
