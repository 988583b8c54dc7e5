//! Maintenance strategy comparison - time-based (TBM) vs predictive (PdM)
//!
//! TBM replaces every unit on a fixed interval, discarding remaining life and
//! still suffering some in-interval failures. PdM replaces at the B10 life:
//! 90% of replacements are planned and 10% are early failures.

use serde::{Deserialize, Serialize};

/// Share of PdM replacements that are planned
const PDM_PLANNED_SHARE: f64 = 0.9;

/// Share of PdM replacements that are unplanned failures before B10
const PDM_FAILURE_SHARE: f64 = 0.1;

/// Cost and life inputs for the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyInputs {
    /// Simulated period (months)
    pub simulation_months: f64,
    /// Units in service
    pub num_components: f64,
    /// Part cost per replacement
    pub part_cost: f64,
    /// Labor cost of a planned replacement
    pub planned_labor_cost: f64,
    /// Labor cost of an emergency replacement
    pub unplanned_labor_cost: f64,
    /// Opportunity loss per hour of downtime
    pub downtime_cost_per_hour: f64,
    /// Mean time to repair (hours)
    pub mttr_hours: f64,
    /// Weibull scale parameter (months)
    pub eta_months: f64,
    /// B10 life (months)
    pub b10_life_months: f64,
    /// TBM replacement interval (months)
    pub tbm_interval_months: f64,
    /// Probability of failure within one TBM interval
    pub tbm_failure_prob: f64,
}

impl Default for StrategyInputs {
    fn default() -> Self {
        Self {
            simulation_months: 60.0,
            num_components: 100.0,
            part_cost: 500_000.0,
            planned_labor_cost: 100_000.0,
            unplanned_labor_cost: 300_000.0,
            downtime_cost_per_hour: 1_000_000.0,
            mttr_hours: 4.0,
            eta_months: 18.0,
            b10_life_months: 16.0,
            tbm_interval_months: 4.0,
            tbm_failure_prob: 0.01,
        }
    }
}

impl StrategyInputs {
    /// Part, emergency labor and downtime cost of one unplanned failure
    pub fn cost_per_failure(&self) -> f64 {
        self.part_cost + self.unplanned_labor_cost + self.downtime_cost_per_hour * self.mttr_hours
    }

    /// Time-based maintenance cost breakdown
    pub fn time_based(&self) -> StrategyCost {
        if !(self.tbm_interval_months > 0.0) {
            return StrategyCost::default();
        }

        let per_component = (self.simulation_months / self.tbm_interval_months).floor();
        let replacements = per_component * self.num_components;

        let planned_cost = replacements * (self.part_cost + self.planned_labor_cost);

        let wasted_life = self.eta_months - self.tbm_interval_months;
        let wasted_life_cost = if wasted_life > 0.0 && self.eta_months > 0.0 {
            replacements * self.part_cost * (wasted_life / self.eta_months)
        } else {
            0.0
        };

        let failure_cost = replacements * self.tbm_failure_prob * self.cost_per_failure();

        StrategyCost {
            planned_cost,
            wasted_life_cost,
            failure_cost,
            total_cost: planned_cost + wasted_life_cost + failure_cost,
            total_replacements: replacements,
        }
    }

    /// Predictive maintenance cost breakdown
    pub fn predictive(&self) -> StrategyCost {
        if !(self.b10_life_months > 0.0) {
            return StrategyCost::default();
        }

        let replacements = self.simulation_months / self.b10_life_months * self.num_components;
        let planned_cost =
            replacements * PDM_PLANNED_SHARE * (self.part_cost + self.planned_labor_cost);
        let failure_cost = replacements * PDM_FAILURE_SHARE * self.cost_per_failure();

        StrategyCost {
            planned_cost,
            wasted_life_cost: 0.0,
            failure_cost,
            total_cost: planned_cost + failure_cost,
            total_replacements: replacements,
        }
    }

    /// Run both strategies
    pub fn compare(&self) -> StrategyComparison {
        let tbm = self.time_based();
        let pdm = self.predictive();
        StrategyComparison {
            savings: tbm.total_cost - pdm.total_cost,
            tbm,
            pdm,
        }
    }
}

/// Cost breakdown of one strategy over the simulated period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyCost {
    pub planned_cost: f64,
    pub wasted_life_cost: f64,
    pub failure_cost: f64,
    pub total_cost: f64,
    pub total_replacements: f64,
}

/// Both strategies side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub tbm: StrategyCost,
    pub pdm: StrategyCost,
    /// TBM total minus PdM total (positive when PdM is cheaper)
    pub savings: f64,
}
