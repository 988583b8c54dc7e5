//! Failure probability ranking
//!
//! Orders units by their probability of failing within the horizon, highest
//! first. Equal probabilities keep their input order.

use serde::{Deserialize, Serialize};

use crate::entities::forecast::Estimator;
use crate::entities::unit::{HorizonWindow, UnitObservation};

/// Optional filters applied after sorting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    /// Keep at most this many units
    pub top_n: Option<usize>,
    /// Drop units below this probability
    pub min_probability: Option<f64>,
}

impl RankOptions {
    pub fn top(n: usize) -> Self {
        Self {
            top_n: Some(n),
            min_probability: None,
        }
    }

    pub fn at_least(min_probability: f64) -> Self {
        Self {
            top_n: None,
            min_probability: Some(min_probability),
        }
    }
}

/// A unit together with its window failure probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUnit {
    pub serial: String,
    pub age_hours: f64,
    pub beta: f64,
    pub eta: f64,
    pub probability: f64,
}

impl RankedUnit {
    /// Probability as a percentage, e.g. `12.34`
    pub fn probability_percent(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Rank units with the default (conditional) estimator
pub fn rank_by_probability(
    units: &[UnitObservation],
    horizon_hours: f64,
    options: &RankOptions,
) -> Vec<RankedUnit> {
    rank_with(
        &Estimator::default(),
        units,
        HorizonWindow::from_hours(horizon_hours),
        options,
    )
}

pub(crate) fn rank_with(
    estimator: &Estimator,
    units: &[UnitObservation],
    horizon: HorizonWindow,
    options: &RankOptions,
) -> Vec<RankedUnit> {
    let mut ranked: Vec<RankedUnit> = units
        .iter()
        .map(|unit| RankedUnit {
            serial: unit.serial.clone(),
            age_hours: unit.age_hours,
            beta: unit.beta,
            eta: unit.eta,
            probability: estimator.probability(unit, horizon),
        })
        .collect();

    // Vec::sort_by is stable; probabilities are never NaN
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    if let Some(min) = options.min_probability {
        ranked.retain(|r| r.probability >= min);
    }
    if let Some(n) = options.top_n {
        ranked.truncate(n);
    }

    ranked
}
