//! Project discovery and structure
//!
//! A project is any directory containing a `.pcf/` folder. It holds the
//! project-level configuration and, by convention, snapshot files under
//! `data/`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".pcf";

/// Represents a forecast project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .pcf/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root)
    }

    /// Initialize even if .pcf/ exists, overwriting the default files
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };

        std::fs::create_dir_all(project.pcf_dir()).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::create_dir_all(project.data_dir()).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.data_dir().join("snapshot.yaml"), Self::sample_snapshot())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# Parts Cycle Forecast project configuration

# Forecast horizon in days (30, 60, 90 and 180 are the usual choices)
# horizon_days: 90

# Rows shown per part by `pcf rank`
# top_n: 10

# Only rank units at or above this failure probability (0-1)
# min_probability: 0.05

# Window probability formula: conditional | unconditional
# policy: conditional

# Default output format (auto, table, json, yaml, csv, tsv, md)
# default_format: auto

# Currency label appended to costs in table output
# currency: KRW
"#
    }

    fn sample_snapshot() -> &'static str {
        r#"# In-service units with fitted Weibull parameters (eta in hours)
horizon_days: 90
parts:
  - part_id: DCU
    unit_cost_mean: 1000000
    unit_cost_std: 120000
    units:
      - { serial: DCU-0001, age_hours: 2000, beta: 1.5, eta: 10000 }
      - { serial: DCU-0002, age_hours: 7400, beta: 1.5, eta: 10000 }
      - { serial: DCU-0003, age_hours: 12500, beta: 1.5, eta: 10000 }
  - part_id: PUMP
    unit_cost_mean: 450000
    unit_cost_std: 30000
    units:
      - { serial: PMP-0101, age_hours: 8760, beta: 2.0, eta: 8760 }
      - { serial: PMP-0102, age_hours: 1200, beta: 2.0, eta: 8760 }
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .pcf configuration directory
    pub fn pcf_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Project-level configuration file
    pub fn config_path(&self) -> PathBuf {
        self.pcf_dir().join("config.yaml")
    }

    /// Default location for snapshot files
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a forecast project (searched from {searched_from:?}). Run 'pcf init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("forecast project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.pcf_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.data_dir().join("snapshot.yaml").exists());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));

        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_finds_pcf_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_pcf_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_sample_snapshot_is_loadable() {
        let snapshot: crate::core::loader::Snapshot =
            serde_yml::from_str(Project::sample_snapshot()).unwrap();
        assert_eq!(snapshot.parts.len(), 2);
        assert_eq!(snapshot.horizon_days, Some(90));
    }
}
