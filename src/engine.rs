// 🔎 Facet Filter Engine - Cascading availability
// Match, compute what is still selectable, prune, clamp, repeat until stable

use crate::catalog::{Catalog, VehicleRecord};
use crate::facets::{collation_key, Facet, FilterState, YearRange};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;
use tracing::debug;

// ============================================================================
// MATCH PREDICATE
// ============================================================================

/// Which constraint the predicate leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every facet and the year range apply
    All,
    /// Everything except this facet's own selection
    IgnoreFacet(Facet),
    /// Everything except both year bounds
    IgnoreYears,
}

/// True iff the record satisfies every active constraint
pub fn matches(vehicle: &VehicleRecord, state: &FilterState) -> bool {
    matches_within(vehicle, state, Scope::All)
}

pub fn matches_within(vehicle: &VehicleRecord, state: &FilterState, scope: Scope) -> bool {
    for facet in Facet::ALL {
        if scope == Scope::IgnoreFacet(facet) {
            continue;
        }
        let selected = state.selection.get(facet);
        if !selected.is_empty() && !selected.contains(facet.value_of(vehicle)) {
            return false;
        }
    }

    scope == Scope::IgnoreYears || state.years.contains(vehicle.year)
}

// ============================================================================
// AVAILABILITY
// ============================================================================

/// Values each facet could still be set to without guaranteeing zero
/// matches, plus the years reachable under the facet selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    facets: [Vec<String>; 6],
    years: Vec<i32>,
}

impl Availability {
    pub fn values(&self, facet: Facet) -> &[String] {
        &self.facets[facet.index()]
    }

    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        self.values(facet).iter().any(|v| v == value)
    }

    /// Available years, ascending
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    /// Case-insensitive substring search over one facet's values
    pub fn search(&self, facet: Facet, needle: &str) -> Vec<&str> {
        let needle = needle.trim().to_lowercase();
        self.values(facet)
            .iter()
            .filter(|v| v.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Facet::ALL.len() + 1))?;
        for facet in Facet::ALL {
            map.serialize_entry(facet.key(), self.values(facet))?;
        }
        map.serialize_entry("years", &self.years)?;
        map.end()
    }
}

/// Availability for every facet and for years, computed from an untouched
/// state. Each facet ignores only its own selection.
pub fn compute_availability(catalog: &Catalog, state: &FilterState) -> Availability {
    Availability {
        facets: Facet::ALL.map(|facet| facet_values(catalog, state, facet)),
        years: available_years(catalog, state),
    }
}

fn facet_values(catalog: &Catalog, state: &FilterState, facet: Facet) -> Vec<String> {
    let distinct: BTreeSet<&str> = catalog
        .vehicles()
        .iter()
        .filter(|v| matches_within(v, state, Scope::IgnoreFacet(facet)))
        .map(|v| facet.value_of(v))
        .filter(|value| !value.trim().is_empty())
        .collect();

    let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    values.sort_by_cached_key(|v| collation_key(v));
    values
}

fn available_years(catalog: &Catalog, state: &FilterState) -> Vec<i32> {
    catalog
        .vehicles()
        .iter()
        .filter(|v| matches_within(v, state, Scope::IgnoreYears))
        .filter_map(|v| v.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// PRUNE & CLAMP
// ============================================================================

/// Apply one availability pass to the state: drop selected values that are
/// no longer available and fit the year range into the available years.
pub fn prune_and_clamp(state: &FilterState, availability: &Availability) -> FilterState {
    let mut next = state.clone();

    for facet in Facet::ALL {
        next.selection
            .retain(facet, |value| availability.contains(facet, value));
    }
    next.years = state.years.clamp_to(availability.years());

    next
}

// ============================================================================
// FILTER SESSION
// ============================================================================

/// The single owner of the catalog and of the user's current filter state.
///
/// Every mutation runs `recompute` before returning, so callers always see
/// a pruned selection, a clamped year range and fresh availability.
#[derive(Debug, Clone)]
pub struct FilterSession {
    catalog: Catalog,
    state: FilterState,
    availability: Availability,
    matched: Vec<usize>,
}

impl FilterSession {
    /// Start unrestricted; the first pass opens the year range to the full
    /// span of catalog years.
    pub fn new(catalog: Catalog) -> Self {
        let mut session = FilterSession {
            catalog,
            state: FilterState::default(),
            availability: Availability::default(),
            matched: Vec::new(),
        };
        session.recompute();
        session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    /// Records matching the current state, in catalog order
    pub fn matched(&self) -> impl Iterator<Item = &VehicleRecord> + '_ {
        let vehicles = self.catalog.vehicles();
        self.matched.iter().map(move |&i| &vehicles[i])
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Flip one value; returns whether it was switched on (pruning may still drop it)
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let selected = self.state.selection.toggle(facet, value);
        self.recompute();
        selected
    }

    pub fn select(&mut self, facet: Facet, value: impl Into<String>) {
        self.state.selection.insert(facet, value);
        self.recompute();
    }

    pub fn deselect(&mut self, facet: Facet, value: &str) {
        self.state.selection.remove(facet, value);
        self.recompute();
    }

    pub fn set_selection<I, S>(&mut self, facet: Facet, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.selection.replace(facet, values);
        self.recompute();
    }

    /// "All" quick action: exactly the given (usually search-filtered) values
    pub fn select_only<I, S>(&mut self, facet: Facet, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_selection(facet, values);
    }

    /// "None" quick action: the facet becomes unrestricted
    pub fn clear(&mut self, facet: Facet) {
        self.state.selection.clear(facet);
        self.recompute();
    }

    /// Moving `from` past `to` drags `to` along with it
    pub fn set_year_from(&mut self, from: Option<i32>) {
        self.state.years.from = from;
        if let (Some(from), Some(to)) = (from, self.state.years.to) {
            if from > to {
                self.state.years.to = Some(from);
            }
        }
        self.recompute();
    }

    /// Moving `to` below `from` drags `from` along with it
    pub fn set_year_to(&mut self, to: Option<i32>) {
        self.state.years.to = to;
        if let (Some(from), Some(to)) = (self.state.years.from, to) {
            if from > to {
                self.state.years.from = Some(to);
            }
        }
        self.recompute();
    }

    pub fn set_years(&mut self, years: YearRange) {
        self.state.years = years;
        self.recompute();
    }

    /// Replace the whole selection at once; pruning sees it as one change
    pub fn set_state(&mut self, state: FilterState) {
        self.state = state;
        self.recompute();
    }

    /// Drop every facet selection and reopen the full year range
    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.recompute();
    }

    // ------------------------------------------------------------------------
    // Recompute
    // ------------------------------------------------------------------------

    /// Recompute availability and prune/clamp until the state stops moving.
    ///
    /// Each pass derives availability from the untouched state and applies
    /// every prune and the clamp at once. Returns the number of passes.
    pub fn recompute(&mut self) -> usize {
        let mut passes = 0;

        loop {
            passes += 1;
            let availability = compute_availability(&self.catalog, &self.state);
            let next = prune_and_clamp(&self.state, &availability);

            if next == self.state {
                self.availability = availability;
                break;
            }

            for facet in Facet::ALL {
                let before = self.state.selection.get(facet);
                let after = next.selection.get(facet);
                if before.len() != after.len() {
                    debug!(
                        facet = facet.key(),
                        dropped = ?before.difference(after).collect::<Vec<_>>(),
                        "pruned unavailable selections"
                    );
                }
            }
            if next.years != self.state.years {
                debug!(from = ?next.years.from, to = ?next.years.to, "year range clamped");
            }

            self.state = next;
        }

        self.matched = self
            .catalog
            .vehicles()
            .iter()
            .enumerate()
            .filter(|(_, v)| matches(v, &self.state))
            .map(|(i, _)| i)
            .collect();

        debug!(passes, matched = self.matched.len(), "filter recomputed");
        passes
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build catalog rows with the attributes the tests care about
    fn vehicle(year: Option<i32>, make: &str, model: &str, engine: &str) -> VehicleRecord {
        VehicleRecord {
            id: format!("{}-{}-{:?}", make, model, year),
            year,
            make: make.to_string(),
            model: model.to_string(),
            engine: engine.to_string(),
            transmission: "AUTO".to_string(),
            drivetrain: "4WD".to_string(),
            fuel: "GAS".to_string(),
        }
    }

    fn trucks() -> Catalog {
        Catalog::new(vec![
            vehicle(Some(2020), "Ford", "F150", "V8"),
            vehicle(Some(2021), "Ford", "F150", "V6"),
            vehicle(Some(2020), "Toyota", "Corolla", "I4"),
        ])
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let state = FilterState::default();
        for v in trucks().vehicles() {
            assert!(matches(v, &state));
        }
    }

    #[test]
    fn test_match_is_conjunctive_and_exact() {
        let mut state = FilterState::default();
        state.selection.insert(Facet::Make, "Ford");
        state.selection.insert(Facet::Engine, "V8");

        let catalog = trucks();
        let hits: Vec<_> = catalog.vehicles().iter().filter(|v| matches(v, &state)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].engine, "V8");

        let mut lower = FilterState::default();
        lower.selection.insert(Facet::Make, "ford");
        assert!(!catalog.vehicles().iter().any(|v| matches(v, &lower)), "case-sensitive");
    }

    #[test]
    fn test_missing_year_never_excluded_by_range() {
        let mut state = FilterState::default();
        state.years = YearRange::new(Some(2030), Some(2031));

        assert!(matches(&vehicle(None, "Ford", "F150", "V8"), &state));
        assert!(!matches(&vehicle(Some(2020), "Ford", "F150", "V8"), &state));
    }

    #[test]
    fn test_facet_ignores_its_own_selection() {
        let mut state = FilterState::default();
        state.selection.insert(Facet::Make, "Ford");

        let availability = compute_availability(&trucks(), &state);
        assert_eq!(availability.values(Facet::Make), ["Ford", "Toyota"]);
        assert_eq!(availability.values(Facet::Model), ["F150"]);
        assert_eq!(availability.values(Facet::Engine), ["V6", "V8"]);
        assert_eq!(availability.years(), [2020, 2021]);
    }

    #[test]
    fn test_year_availability_ignores_both_bounds() {
        let mut state = FilterState::default();
        state.years = YearRange::new(Some(2021), Some(2021));

        let availability = compute_availability(&trucks(), &state);
        assert_eq!(availability.years(), [2020, 2021]);
        assert_eq!(availability.values(Facet::Make), ["Ford"], "facets still honour the range");
    }

    #[test]
    fn test_blank_values_not_offered() {
        let catalog = Catalog::new(vec![
            vehicle(Some(2020), "Ford", "F150", ""),
            vehicle(Some(2020), "Ford", "F150", "V8"),
        ]);
        let availability = compute_availability(&catalog, &FilterState::default());
        assert_eq!(availability.values(Facet::Engine), ["V8"]);
    }

    #[test]
    fn test_prune_uses_pre_prune_state() {
        // Both selections are individually unavailable given the other; a
        // sequential prune would keep one of them
        let mut state = FilterState::default();
        state.selection.insert(Facet::Make, "Toyota");
        state.selection.insert(Facet::Model, "F150");

        let availability = compute_availability(&trucks(), &state);
        let next = prune_and_clamp(&state, &availability);

        assert!(next.selection.is_empty());
    }

    #[test]
    fn test_session_scenario_ford() {
        let mut session = FilterSession::new(trucks());
        session.select(Facet::Make, "Ford");

        let availability = session.availability();
        assert_eq!(availability.values(Facet::Model), ["F150"]);
        assert_eq!(availability.values(Facet::Engine), ["V6", "V8"]);
        assert_eq!(availability.years(), [2020, 2021]);

        assert_eq!(session.match_count(), 2);
        assert!(session.matched().all(|v| v.make == "Ford"));
    }

    #[test]
    fn test_session_initial_year_range_spans_catalog() {
        let session = FilterSession::new(trucks());
        assert_eq!(session.state().years, YearRange::new(Some(2020), Some(2021)));
        assert_eq!(session.match_count(), 3);
    }

    #[test]
    fn test_session_switching_make_clears_dependent_selections() {
        let mut session = FilterSession::new(trucks());
        session.select(Facet::Make, "Ford");
        session.select(Facet::Model, "F150");
        session.select(Facet::Engine, "V8");
        assert_eq!(session.match_count(), 1);

        session.set_selection(Facet::Make, ["Toyota"]);

        let selection = &session.state().selection;
        assert!(selection.is_unrestricted(Facet::Model));
        assert!(selection.is_unrestricted(Facet::Engine));
        // Toyota was not offered under F150/V8 either, so it drops out too
        assert!(selection.is_unrestricted(Facet::Make));
        assert_eq!(session.match_count(), 3);
    }

    #[test]
    fn test_session_year_from_past_window_collapses() {
        let catalog = Catalog::new(
            (2019..=2023)
                .map(|y| vehicle(Some(y), "Ford", "F150", "V8"))
                .collect(),
        );
        let mut session = FilterSession::new(catalog);

        session.set_years(YearRange::new(Some(2020), Some(2021)));
        assert_eq!(session.state().years, YearRange::new(Some(2020), Some(2021)));

        session.set_year_from(Some(2025));
        assert_eq!(session.state().years, YearRange::new(Some(2023), Some(2023)));
    }

    #[test]
    fn test_session_year_to_below_from_pulls_from_down() {
        let catalog = Catalog::new(
            (2019..=2023)
                .map(|y| vehicle(Some(y), "Ford", "F150", "V8"))
                .collect(),
        );
        let mut session = FilterSession::new(catalog);

        session.set_years(YearRange::new(Some(2021), Some(2022)));
        session.set_year_to(Some(2020));
        assert_eq!(session.state().years, YearRange::new(Some(2020), Some(2020)));
        assert_eq!(session.match_count(), 1);
    }

    #[test]
    fn test_no_years_available_clears_range() {
        let catalog = Catalog::new(vec![vehicle(None, "Ford", "F150", "V8")]);
        let session = FilterSession::new(catalog);

        assert_eq!(session.state().years, YearRange::default());
        assert_eq!(session.match_count(), 1);
    }

    #[test]
    fn test_recompute_reaches_fixed_point() {
        // Pruning Toyota out of make shrinks the year candidates, which the
        // next pass turns into a tighter clamp
        let catalog = Catalog::new(vec![
            vehicle(Some(2020), "Ford", "F150", "V8"),
            vehicle(Some(2025), "Toyota", "F150", "V8"),
            vehicle(Some(2018), "Honda", "Civic", "I4"),
        ]);
        let mut session = FilterSession::new(catalog);
        session.set_years(YearRange::new(Some(2018), Some(2021)));
        session.set_selection(Facet::Make, ["Ford", "Toyota"]);

        let state = session.state().clone();
        let availability = session.availability().clone();

        assert_eq!(session.recompute(), 1, "already stable");
        assert_eq!(session.state(), &state);
        assert_eq!(session.availability(), &availability);

        assert!(state.selection.contains(Facet::Make, "Ford"));
        assert!(!state.selection.contains(Facet::Make, "Toyota"));
        assert_eq!(state.years, YearRange::new(Some(2020), Some(2020)));
    }

    #[test]
    fn test_reset_restores_full_catalog() {
        let mut session = FilterSession::new(trucks());
        session.select(Facet::Make, "Toyota");
        session.set_year_to(Some(2020));
        assert_eq!(session.match_count(), 1);

        session.reset();
        assert!(session.state().selection.is_empty());
        assert_eq!(session.state().years, YearRange::new(Some(2020), Some(2021)));
        assert_eq!(session.match_count(), 3);
    }

    #[test]
    fn test_search_filters_available_values() {
        let session = FilterSession::new(trucks());
        assert_eq!(session.availability().search(Facet::Make, "to"), vec!["Toyota"]);
        assert_eq!(session.availability().search(Facet::Model, ""), vec!["Corolla", "F150"]);
    }
}
