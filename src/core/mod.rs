//! Core module - estimator math, configuration, project layout and loading

pub mod config;
pub mod loader;
pub mod logging;
pub mod project;
pub mod weibull;

pub use config::Config;
pub use loader::{load_costs, load_snapshot, CostStats, LoadError, Snapshot};
pub use project::{Project, ProjectError};
pub use weibull::{cdf, probability_of_failure_in_window, window_probability, WeibullParams, WindowPolicy};
