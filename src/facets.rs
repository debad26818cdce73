// 🧭 Facets - The six filter dimensions + year range
// Selection state owned by the filter session

use crate::catalog::VehicleRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// FACET
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Make,
    Model,
    Engine,
    Transmission,
    Drivetrain,
    Fuel,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Make,
        Facet::Model,
        Facet::Engine,
        Facet::Transmission,
        Facet::Drivetrain,
        Facet::Fuel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the export file
    pub fn key(&self) -> &'static str {
        match self {
            Facet::Make => "make",
            Facet::Model => "model",
            Facet::Engine => "engine",
            Facet::Transmission => "trans",
            Facet::Drivetrain => "propul",
            Facet::Fuel => "fuel",
        }
    }

    /// Human-readable name for display
    pub fn label(&self) -> &'static str {
        match self {
            Facet::Make => "Make",
            Facet::Model => "Model",
            Facet::Engine => "Engine",
            Facet::Transmission => "Transmission",
            Facet::Drivetrain => "Drivetrain",
            Facet::Fuel => "Fuel",
        }
    }

    /// The record attribute this facet filters on
    pub fn value_of<'a>(&self, vehicle: &'a VehicleRecord) -> &'a str {
        match self {
            Facet::Make => &vehicle.make,
            Facet::Model => &vehicle.model,
            Facet::Engine => &vehicle.engine,
            Facet::Transmission => &vehicle.transmission,
            Facet::Drivetrain => &vehicle.drivetrain,
            Facet::Fuel => &vehicle.fuel,
        }
    }
}

// ============================================================================
// FACET SELECTION
// ============================================================================

/// Selected values per facet.
///
/// An EMPTY set means the facet is unrestricted (matches every value), not
/// that everything is excluded. The whole engine depends on this: clearing a
/// facet and pruning every value out of it both widen the match set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    sets: [BTreeSet<String>; 6],
}

impl FacetSelection {
    pub fn get(&self, facet: Facet) -> &BTreeSet<String> {
        &self.sets[facet.index()]
    }

    pub fn is_unrestricted(&self, facet: Facet) -> bool {
        self.get(facet).is_empty()
    }

    /// True when no facet restricts anything
    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(BTreeSet::is_empty)
    }

    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        self.get(facet).contains(value)
    }

    pub fn insert(&mut self, facet: Facet, value: impl Into<String>) -> bool {
        self.sets[facet.index()].insert(value.into())
    }

    pub fn remove(&mut self, facet: Facet, value: &str) -> bool {
        self.sets[facet.index()].remove(value)
    }

    /// Flip membership of a value; returns whether it is now selected
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let set = &mut self.sets[facet.index()];
        if set.remove(value) {
            false
        } else {
            set.insert(value.to_string());
            true
        }
    }

    pub fn replace<I, S>(&mut self, facet: Facet, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets[facet.index()] = values.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self, facet: Facet) {
        self.sets[facet.index()].clear();
    }

    pub fn clear_all(&mut self) {
        self.sets.iter_mut().for_each(BTreeSet::clear);
    }

    pub fn retain<F>(&mut self, facet: Facet, keep: F)
    where
        F: FnMut(&String) -> bool,
    {
        self.sets[facet.index()].retain(keep);
    }

    /// Pipe-joined values in ascending order; empty string when unrestricted
    pub fn to_pipe(&self, facet: Facet) -> String {
        self.get(facet)
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Serialize for FacetSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Facet::ALL.len()))?;
        for facet in Facet::ALL {
            map.serialize_entry(facet.key(), self.get(facet))?;
        }
        map.end()
    }
}

// ============================================================================
// YEAR RANGE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    pub fn new(from: Option<i32>, to: Option<i32>) -> Self {
        YearRange { from, to }
    }

    /// Records without a parseable year are always in range
    pub fn contains(&self, year: Option<i32>) -> bool {
        let Some(year) = year else {
            return true;
        };
        if matches!(self.from, Some(from) if year < from) {
            return false;
        }
        if matches!(self.to, Some(to) if year > to) {
            return false;
        }
        true
    }

    /// Fit the range into the available years (ascending).
    ///
    /// Missing bounds default to the extremes; if the bounds cross, `from`
    /// is pulled down to `to`, never the other way round.
    pub fn clamp_to(&self, available: &[i32]) -> YearRange {
        let (Some(&min), Some(&max)) = (available.first(), available.last()) else {
            return YearRange::default();
        };

        let mut from = self.from.unwrap_or(min).max(min);
        // `to` below the window would drag `from` out of it through the tie-break
        let to = self.to.unwrap_or(max).clamp(min, max);
        if from > to {
            from = to;
        }

        YearRange {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn from_text(&self) -> String {
        self.from.map(|y| y.to_string()).unwrap_or_default()
    }

    pub fn to_text(&self) -> String {
        self.to.map(|y| y.to_string()).unwrap_or_default()
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

/// Everything the user has chosen: six facet sets plus the year range.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FilterState {
    pub selection: FacetSelection,
    pub years: YearRange,
}

// ============================================================================
// NATURAL ORDER
// ============================================================================

/// Locale-style ordering for facet values: digit runs compare numerically
/// ("2" < "10") and letters compare on their base letter, so "Škoda" sorts
/// with the S. Accents break ties first ("Citroen" < "Citroën"), then case,
/// with lowercase before uppercase.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Precomputed sort key behind `natural_cmp`, for `sort_by_cached_key`.
/// Fields compare in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: Vec<Token>,
    accents: Vec<Vec<char>>,
    case: Vec<bool>,
    raw: String,
}

/// Punctuation and spaces sort before numbers, numbers before letters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Token {
    Symbol(char),
    // significant digit count, then the digits
    Number(usize, String),
    Letter(char),
}

pub fn collation_key(s: &str) -> CollationKey {
    let mut primary = Vec::new();
    let mut accents: Vec<Vec<char>> = Vec::new();
    let mut case = Vec::new();

    let mut chars = s.nfd().peekable();
    while let Some(c) = chars.next() {
        if is_combining_mark(c) {
            if let Some(marks) = accents.last_mut() {
                marks.push(c);
            }
            continue;
        }

        if c.is_ascii_digit() {
            let mut digits = String::from(c);
            while let Some(d) = chars.next_if(|d| d.is_ascii_digit()) {
                digits.push(d);
            }
            let significant = digits.trim_start_matches('0').to_string();
            primary.push(Token::Number(significant.len(), significant));
            accents.push(Vec::new());
            continue;
        }

        if c.is_alphanumeric() {
            primary.push(Token::Letter(fold(c)));
            case.push(c.is_uppercase());
        } else {
            primary.push(Token::Symbol(c));
        }
        accents.push(Vec::new());
    }

    CollationKey {
        primary,
        accents,
        case,
        raw: s.to_string(),
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

// ============================================================================
// TESTS
// ============================================================================
