//! Snapshot loading - unit observations and cost statistics from files
//!
//! Supported inputs:
//! - YAML (`.yaml`/`.yml`) and JSON (`.json`) snapshots with a `parts` list
//! - CSV unit lists (`part_id,serial,age_hours,beta,eta`)
//! - CSV cost tables (`part_id,unit_cost_mean,unit_cost_std`)
//!
//! Numeric fields are coerced leniently: missing, blank or non-numeric
//! values become zero. Structural problems (no `parts` list, no `part_id`
//! column, unreadable files) are reported as [`LoadError`].

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::forecast::PartGroup;
use crate::entities::unit::{coerce_f64, UnitObservation};
use crate::yaml::diagnostics::SnapshotSyntaxError;

/// A point-in-time list of part types and their in-service units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Horizon suggested by the data source, in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_days: Option<u32>,

    pub parts: Vec<PartGroup>,
}

/// Cost statistics for one part type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub mean: f64,
    pub std: f64,
}

impl Snapshot {
    /// Look up a part group by id
    pub fn part(&self, part_id: &str) -> Option<&PartGroup> {
        self.parts.iter().find(|p| p.part_id == part_id)
    }

    /// Total number of units across all parts
    pub fn unit_count(&self) -> usize {
        self.parts.iter().map(|p| p.units.len()).sum()
    }

    /// Overwrite cost statistics for every part listed in `costs`
    pub fn apply_costs(&mut self, costs: &IndexMap<String, CostStats>) {
        for part in &mut self.parts {
            if let Some(stats) = costs.get(&part.part_id) {
                part.unit_cost_mean = stats.mean;
                part.unit_cost_std = stats.std;
            }
        }

        for part_id in costs.keys() {
            if self.part(part_id).is_none() {
                tracing::debug!(part_id = %part_id, "cost row has no matching part in snapshot");
            }
        }
    }
}

/// Errors raised while loading snapshot or cost files
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    #[diagnostic(code(pcf::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported snapshot format: {0}")]
    #[diagnostic(
        code(pcf::load::format),
        help("Use a .yaml, .yml, .json or .csv file")
    )]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SnapshotSyntaxError),

    #[error("{name}: required column '{column}' is missing")]
    #[diagnostic(code(pcf::load::column))]
    MissingColumn { name: String, column: &'static str },

    #[error("{name}: CSV parse error at row {row}: {message}")]
    #[diagnostic(code(pcf::load::csv))]
    Csv {
        name: String,
        row: usize,
        message: String,
    },
}

/// Input file kinds recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Yaml,
    Json,
    Csv,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(SnapshotFormat::Yaml),
            "json" => Some(SnapshotFormat::Json),
            "csv" => Some(SnapshotFormat::Csv),
            _ => None,
        }
    }
}

/// Load a snapshot, picking the parser from the file extension
pub fn load_snapshot(path: &Path) -> Result<Snapshot, LoadError> {
    let format =
        SnapshotFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let name = path.display().to_string();

    let snapshot = match format {
        SnapshotFormat::Yaml => parse_yaml(&read_file(path)?, &name)?,
        SnapshotFormat::Json => parse_json(&read_file(path)?, &name)?,
        SnapshotFormat::Csv => {
            let file = open_file(path)?;
            Snapshot {
                horizon_days: None,
                parts: read_units_csv(file, &name)?,
            }
        }
    };

    tracing::info!(
        path = %name,
        parts = snapshot.parts.len(),
        units = snapshot.unit_count(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Load a cost table CSV
pub fn load_costs(path: &Path) -> Result<IndexMap<String, CostStats>, LoadError> {
    let name = path.display().to_string();
    let costs = read_costs_csv(open_file(path)?, &name)?;
    tracing::info!(path = %name, parts = costs.len(), "loaded cost table");
    Ok(costs)
}

pub fn parse_yaml(source: &str, name: &str) -> Result<Snapshot, LoadError> {
    serde_yml::from_str(source)
        .map_err(|e| SnapshotSyntaxError::from_yaml_error(&e, source, name).into())
}

pub fn parse_json(source: &str, name: &str) -> Result<Snapshot, LoadError> {
    serde_json::from_str(source)
        .map_err(|e| SnapshotSyntaxError::from_json_error(&e, source, name).into())
}

/// Read unit rows, grouping them by `part_id` in order of first appearance
pub fn read_units_csv<R: Read>(reader: R, name: &str) -> Result<Vec<PartGroup>, LoadError> {
    let mut rdr = csv_reader(reader);
    let header_map = header_map(&mut rdr, name)?;
    require_column(&header_map, name, "part_id")?;

    for column in ["age_hours", "beta", "eta"] {
        if !header_map.contains_key(column) {
            tracing::warn!(file = %name, column, "column missing, values default to 0");
        }
    }

    let mut groups: IndexMap<String, PartGroup> = IndexMap::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let row = row_idx + 2; // 1-indexed plus header row
        let record = result.map_err(|e| LoadError::Csv {
            name: name.to_string(),
            row,
            message: e.to_string(),
        })?;

        let Some(part_id) = get_field(&record, &header_map, "part_id") else {
            tracing::warn!(file = %name, row, "skipping row without part_id");
            continue;
        };

        let unit = UnitObservation {
            serial: get_field(&record, &header_map, "serial").unwrap_or_default(),
            age_hours: get_number(&record, &header_map, "age_hours"),
            beta: get_number(&record, &header_map, "beta"),
            eta: get_number(&record, &header_map, "eta"),
        };

        groups
            .entry(part_id.clone())
            .or_insert_with(|| PartGroup::new(part_id))
            .units
            .push(unit);
    }

    Ok(groups.into_values().collect())
}

/// Read per-part cost statistics
pub fn read_costs_csv<R: Read>(reader: R, name: &str) -> Result<IndexMap<String, CostStats>, LoadError> {
    let mut rdr = csv_reader(reader);
    let header_map = header_map(&mut rdr, name)?;
    require_column(&header_map, name, "part_id")?;
    require_column(&header_map, name, "unit_cost_mean")?;

    let mut costs = IndexMap::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let row = row_idx + 2;
        let record = result.map_err(|e| LoadError::Csv {
            name: name.to_string(),
            row,
            message: e.to_string(),
        })?;

        let Some(part_id) = get_field(&record, &header_map, "part_id") else {
            tracing::warn!(file = %name, row, "skipping cost row without part_id");
            continue;
        };

        costs.insert(
            part_id,
            CostStats {
                mean: get_number(&record, &header_map, "unit_cost_mean"),
                std: get_number(&record, &header_map, "unit_cost_std"),
            },
        );
    }

    Ok(costs)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn open_file(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn header_map<R: Read>(rdr: &mut csv::Reader<R>, name: &str) -> Result<HashMap<String, usize>, LoadError> {
    let headers = rdr.headers().map_err(|e| LoadError::Csv {
        name: name.to_string(),
        row: 1,
        message: e.to_string(),
    })?;

    Ok(headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect())
}

fn require_column(
    header_map: &HashMap<String, usize>,
    name: &str,
    column: &'static str,
) -> Result<(), LoadError> {
    if header_map.contains_key(column) {
        Ok(())
    } else {
        Err(LoadError::MissingColumn {
            name: name.to_string(),
            column,
        })
    }
}

fn get_field(record: &StringRecord, header_map: &HashMap<String, usize>, field: &str) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_number(record: &StringRecord, header_map: &HashMap<String, usize>, field: &str) -> f64 {
    get_field(record, header_map, field)
        .map(|s| coerce_f64(&s))
        .unwrap_or(0.0)
}
