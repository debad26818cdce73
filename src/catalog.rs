// 🚗 Vehicle Catalog - Load once, read forever
// CSV rows → canonical VehicleRecord / MaintenanceType

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// LOAD ERRORS
// ============================================================================

/// Fatal startup error: one of the two tabular resources could not be read.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {resource} catalog at {path:?}")]
    Open {
        resource: &'static str,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot read {resource} catalog")]
    Read {
        resource: &'static str,
        #[source]
        source: csv::Error,
    },
}

const VEHICLES: &str = "vehicle";
const MAINTENANCE_TYPES: &str = "maintenance type";

// ============================================================================
// COLUMN ALIASES
// ============================================================================

/// Accepted header spellings per canonical field, in priority order.
/// Exact matches win over case-insensitive ones.
const VEHICLE_COLUMNS: [(&str, &[&str]); 8] = [
    ("id", &["id", "ID", "vehicle_id"]),
    ("year", &["year", "Year"]),
    ("make", &["make", "Make"]),
    ("model", &["model", "Model"]),
    ("engine", &["engine", "Engine"]),
    ("trans", &["trans", "Trans"]),
    ("propul", &["propul", "drive", "Propul", "Drive"]),
    ("fuel", &["fuel", "Fuel"]),
];

const COL_ID: usize = 0;
const COL_YEAR: usize = 1;
const COL_MAKE: usize = 2;
const COL_MODEL: usize = 3;
const COL_ENGINE: usize = 4;
const COL_TRANS: usize = 5;
const COL_PROPUL: usize = 6;
const COL_FUEL: usize = 7;

const MAINTENANCE_COLUMNS: [(&str, &[&str]); 2] = [
    ("maint_code", &["maint_code", "maint_c", "code", "maintenance_code"]),
    ("maint_name", &["maint_name", "name"]),
];

const COL_CODE: usize = 0;
const COL_NAME: usize = 1;

/// Header row resolved against an alias table: for every canonical field,
/// the candidate column indices in alias priority order.
#[derive(Debug, Clone)]
struct ColumnMap {
    columns: Vec<Vec<usize>>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord, table: &[(&str, &[&str])], resource: &str) -> Self {
        let columns = table
            .iter()
            .map(|(canonical, aliases)| {
                let mut found: Vec<usize> = Vec::new();

                for alias in aliases.iter() {
                    if let Some(i) = headers.iter().position(|h| h.trim() == *alias) {
                        if !found.contains(&i) {
                            found.push(i);
                        }
                    }
                }

                for alias in aliases.iter() {
                    for (i, header) in headers.iter().enumerate() {
                        if header.trim().eq_ignore_ascii_case(alias) && !found.contains(&i) {
                            found.push(i);
                        }
                    }
                }

                if found.is_empty() {
                    warn!(resource, column = *canonical, "column not found in header, reading as empty");
                }
                found
            })
            .collect();

        ColumnMap { columns }
    }

    /// Value of the first candidate column present in the row, trimmed.
    fn first<'r>(&self, field: usize, row: &'r StringRecord) -> &'r str {
        self.columns[field]
            .iter()
            .find_map(|&i| row.get(i))
            .unwrap_or("")
            .trim()
    }

    /// First candidate column whose trimmed value is non-blank.
    fn first_non_blank<'r>(&self, field: usize, row: &'r StringRecord) -> &'r str {
        self.columns[field]
            .iter()
            .filter_map(|&i| row.get(i))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}

/// Parse a year cell: optional sign, then the leading run of ASCII digits.
/// Anything without leading digits is absent rather than an error; a digit
/// run too long for `i32` saturates so the year range still excludes it.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let value: i32 = rest[..end].parse().unwrap_or(i32::MAX);
    Some(if negative { -value } else { value })
}

// ============================================================================
// VEHICLE RECORD
// ============================================================================

/// One catalog row in canonical shape. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRecord {
    pub id: String,
    pub year: Option<i32>,
    pub make: String,
    pub model: String,
    pub engine: String,
    pub transmission: String,
    pub drivetrain: String,
    pub fuel: String,
}

impl VehicleRecord {
    /// Build a record from a raw row. Rows with a blank year, make or model
    /// are not part of the catalog.
    fn from_row(map: &ColumnMap, row: &StringRecord) -> Option<Self> {
        let year = map.first(COL_YEAR, row);
        let make = map.first(COL_MAKE, row);
        let model = map.first(COL_MODEL, row);

        if year.is_empty() || make.is_empty() || model.is_empty() {
            return None;
        }

        Some(VehicleRecord {
            id: map.first(COL_ID, row).to_string(),
            year: parse_year(year),
            make: make.to_string(),
            model: model.to_string(),
            engine: map.first(COL_ENGINE, row).to_string(),
            transmission: map.first(COL_TRANS, row).to_string(),
            drivetrain: map.first(COL_PROPUL, row).to_string(),
            fuel: map.first(COL_FUEL, row).to_string(),
        })
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// The immutable vehicle catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    vehicles: Vec<VehicleRecord>,
}

impl Catalog {
    pub fn new(vehicles: Vec<VehicleRecord>) -> Self {
        Catalog { vehicles }
    }

    /// Load the vehicle catalog from a CSV file with a header row
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let reader = csv_reader()
            .from_path(path)
            .map_err(|source| LoadError::Open {
                resource: VEHICLES,
                path: path.to_path_buf(),
                source,
            })?;

        let catalog = Self::from_csv(reader)?;
        info!(path = %path.display(), vehicles = catalog.len(), "vehicle catalog loaded");
        Ok(catalog)
    }

    /// Load the vehicle catalog from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_csv(csv_reader().from_reader(reader))
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, LoadError> {
        let read_err = |source| LoadError::Read {
            resource: VEHICLES,
            source,
        };

        let headers = rdr.headers().map_err(read_err)?.clone();
        let map = ColumnMap::resolve(&headers, &VEHICLE_COLUMNS, VEHICLES);

        let mut vehicles = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let row = result.map_err(read_err)?;
            match VehicleRecord::from_row(&map, &row) {
                Some(vehicle) => vehicles.push(vehicle),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "rows without year, make or model left out of catalog");
        }

        Ok(Catalog { vehicles })
    }

    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Distinct parsed years across the whole catalog, ascending
    pub fn years(&self) -> Vec<i32> {
        self.vehicles
            .iter()
            .filter_map(|v| v.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

// ============================================================================
// MAINTENANCE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceType {
    pub code: String,
    pub name: String,
}

impl MaintenanceType {
    /// Dropdown label: "CODE — Name"
    pub fn label(&self) -> String {
        format!("{} — {}", self.code, self.name)
    }
}

/// Selectable maintenance operations, in file order.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceCatalog {
    types: Vec<MaintenanceType>,
}

impl MaintenanceCatalog {
    pub fn new(types: Vec<MaintenanceType>) -> Self {
        MaintenanceCatalog { types }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let reader = csv_reader()
            .from_path(path)
            .map_err(|source| LoadError::Open {
                resource: MAINTENANCE_TYPES,
                path: path.to_path_buf(),
                source,
            })?;

        let catalog = Self::from_csv(reader)?;
        info!(path = %path.display(), types = catalog.len(), "maintenance types loaded");
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_csv(csv_reader().from_reader(reader))
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, LoadError> {
        let read_err = |source| LoadError::Read {
            resource: MAINTENANCE_TYPES,
            source,
        };

        let headers = rdr.headers().map_err(read_err)?.clone();
        let map = ColumnMap::resolve(&headers, &MAINTENANCE_COLUMNS, MAINTENANCE_TYPES);

        let mut types = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(read_err)?;

            let code = map.first_non_blank(COL_CODE, &row);
            if code.is_empty() {
                continue;
            }
            let name = match map.first_non_blank(COL_NAME, &row) {
                "" => code,
                name => name,
            };

            types.push(MaintenanceType {
                code: code.to_string(),
                name: name.to_string(),
            });
        }

        Ok(MaintenanceCatalog { types })
    }

    pub fn types(&self) -> &[MaintenanceType] {
        &self.types
    }

    pub fn find(&self, code: &str) -> Option<&MaintenanceType> {
        self.types.iter().find(|t| t.code == code)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn csv_reader() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year("  2021 "), Some(2021));
        assert_eq!(parse_year("2020abc"), Some(2020));
        assert_eq!(parse_year("20.5"), Some(20));
        assert_eq!(parse_year("abc"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("-"), None);
    }

    #[test]
    fn test_parse_year_saturates_on_overflow() {
        assert_eq!(parse_year("20200000000"), Some(i32::MAX));
        assert_eq!(parse_year("-20200000000"), Some(-i32::MAX));

        let csv = "year,make,model\n20200000000,Ford,F150\n2020,Ford,Ranger\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.years(), vec![2020, i32::MAX]);
    }

    #[test]
    fn test_load_vehicles_canonical_headers() {
        let data = "\
id,year,make,model,engine,trans,propul,fuel
1,2020,Ford,F150,V8,AUTO,4WD,GAS
2,2021,Ford,F150,V6,AUTO,2WD,GAS
";
        let catalog = Catalog::from_reader(data.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        let first = &catalog.vehicles()[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.year, Some(2020));
        assert_eq!(first.make, "Ford");
        assert_eq!(first.transmission, "AUTO");
        assert_eq!(first.drivetrain, "4WD");
        assert_eq!(catalog.years(), vec![2020, 2021]);
    }

    #[test]
    fn test_load_vehicles_alias_headers() {
        let data = "\
ID,Year,MAKE,Model,Engine,Trans,drive,Fuel
7, 2019 , Toyota ,Corolla,I4,CVT,FWD,GAS
";
        let catalog = Catalog::from_reader(data.as_bytes()).unwrap();

        let v = &catalog.vehicles()[0];
        assert_eq!(v.id, "7");
        assert_eq!(v.year, Some(2019));
        assert_eq!(v.make, "Toyota", "case-insensitive header and trimmed value");
        assert_eq!(v.drivetrain, "FWD", "drive is an alias of propul");
    }

    #[test]
    fn test_rows_missing_required_fields_are_dropped() {
        let data = "\
year,make,model,engine
2020,Ford,F150,V8
,Ford,F150,V8
2020,  ,F150,V8
2020,Ford,,V8
abc,Ford,Ranger,I4
";
        let catalog = Catalog::from_reader(data.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.vehicles()[1].model, "Ranger");
        assert_eq!(catalog.vehicles()[1].year, None, "unparseable year kept as absent");
        assert_eq!(catalog.years(), vec![2020]);
    }

    #[test]
    fn test_ragged_rows_read_as_empty() {
        let data = "\
year,make,model,engine,fuel
2020,Ford,F150
";
        let catalog = Catalog::from_reader(data.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.vehicles()[0].engine, "");
        assert_eq!(catalog.vehicles()[0].fuel, "");
    }

    #[test]
    fn test_load_maintenance_types() {
        let data = "\
maint_c,maint_name
OIL01,Oil change
,Nameless
BRK02,
";
        let types = MaintenanceCatalog::from_reader(data.as_bytes()).unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(types.types()[0].label(), "OIL01 — Oil change");
        assert_eq!(types.find("BRK02").unwrap().name, "BRK02", "blank name falls back to code");
    }

    #[test]
    fn test_maintenance_code_falls_back_across_aliases() {
        let data = "\
maint_code,code,name
,TIRE01,Tire rotation
";
        let types = MaintenanceCatalog::from_reader(data.as_bytes()).unwrap();

        assert_eq!(types.types()[0].code, "TIRE01");
        assert_eq!(types.types()[0].name, "Tire rotation");
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "year,make,model").unwrap();
        writeln!(file, "2022,Honda,Civic").unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = Catalog::load("/definitely/not/here/vehicules.csv").unwrap_err();
        assert!(matches!(err, LoadError::Open { resource: "vehicle", .. }));
    }
}
