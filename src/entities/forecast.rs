//! Replacement forecast - expected replacement counts and costs per part type
//!
//! Each unit contributes its window failure probability to the expected
//! replacement count of its part type. Counts are continuous expectations,
//! not numbers of discrete predicted failures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::weibull::WindowPolicy;
use crate::entities::ranking::{RankOptions, RankedUnit};
use crate::entities::unit::{lenient_f64, HorizonWindow, UnitObservation};

/// Two-sided 95% normal quantile used for cost bounds
pub const Z_95: f64 = 1.96;

/// Estimator configuration shared by ranking and aggregation
///
/// Using one value for both keeps ranked probabilities and aggregated counts
/// on the same formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Estimator {
    pub policy: WindowPolicy,
}

impl Estimator {
    pub fn new(policy: WindowPolicy) -> Self {
        Self { policy }
    }

    /// Failure probability of one unit within the horizon
    pub fn probability(&self, unit: &UnitObservation, horizon: HorizonWindow) -> f64 {
        unit.failure_probability(horizon, self.policy)
    }

    /// Aggregate one part type's units into a forecast
    pub fn aggregate(
        &self,
        units: &[UnitObservation],
        horizon: HorizonWindow,
        unit_cost_mean: f64,
        unit_cost_std: f64,
    ) -> PartTypeForecast {
        let expected_replacement_count: f64 = units
            .iter()
            .map(|unit| self.probability(unit, horizon))
            .fold(0.0, |acc, p| acc + p);

        PartTypeForecast {
            unit_count: units.len(),
            expected_replacement_count,
            unit_cost_mean,
            unit_cost_std,
            expected_total_cost: expected_replacement_count * unit_cost_mean,
        }
    }

    /// Forecast every part group, keeping the input order of part types
    pub fn forecast(&self, groups: &[PartGroup], horizon: HorizonWindow) -> FleetForecast {
        let mut parts = IndexMap::with_capacity(groups.len());

        for group in groups {
            let forecast = self.aggregate(
                &group.units,
                horizon,
                group.unit_cost_mean,
                group.unit_cost_std,
            );
            tracing::debug!(
                part_id = %group.part_id,
                units = group.units.len(),
                count = forecast.expected_replacement_count,
                total_cost = forecast.expected_total_cost,
                "aggregated part type"
            );

            // Repeated part ids accumulate into the first entry
            match parts.get_mut(&group.part_id) {
                Some(existing) => {
                    if !same_costs(existing, &forecast) {
                        tracing::warn!(
                            part_id = %group.part_id,
                            kept_mean = existing.unit_cost_mean,
                            kept_std = existing.unit_cost_std,
                            ignored_mean = forecast.unit_cost_mean,
                            ignored_std = forecast.unit_cost_std,
                            "repeated part id with different costs, keeping the first"
                        );
                    }
                    merge_into(existing, &forecast)
                }
                None => {
                    parts.insert(group.part_id.clone(), forecast);
                }
            }
        }

        FleetForecast {
            horizon_days: horizon.days(),
            horizon_hours: horizon.hours(),
            policy: self.policy,
            parts,
        }
    }

    /// Rank units by failure probability
    pub fn rank(
        &self,
        units: &[UnitObservation],
        horizon: HorizonWindow,
        options: &RankOptions,
    ) -> Vec<RankedUnit> {
        crate::entities::ranking::rank_with(self, units, horizon, options)
    }
}

fn same_costs(a: &PartTypeForecast, b: &PartTypeForecast) -> bool {
    a.unit_cost_mean == b.unit_cost_mean && a.unit_cost_std == b.unit_cost_std
}

fn merge_into(existing: &mut PartTypeForecast, extra: &PartTypeForecast) {
    existing.unit_count += extra.unit_count;
    existing.expected_replacement_count += extra.expected_replacement_count;
    existing.expected_total_cost = existing.expected_replacement_count * existing.unit_cost_mean;
}

/// Aggregate a part type's units with the default (conditional) estimator.
///
/// `expected_replacement_count` is the sum of each unit's window failure
/// probability; `expected_total_cost` multiplies it by the mean unit cost.
pub fn aggregate_forecast(
    units: &[UnitObservation],
    horizon_hours: f64,
    unit_cost_mean: f64,
    unit_cost_std: f64,
) -> PartTypeForecast {
    Estimator::default().aggregate(
        units,
        HorizonWindow::from_hours(horizon_hours),
        unit_cost_mean,
        unit_cost_std,
    )
}

/// Grand total over part-type forecasts
pub fn grand_total<'a, I>(forecasts: I) -> f64
where
    I: IntoIterator<Item = &'a PartTypeForecast>,
{
    forecasts
        .into_iter()
        .fold(0.0, |acc, f| acc + f.expected_total_cost)
}

/// Input for one part type: cost statistics and in-service units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartGroup {
    pub part_id: String,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_cost_mean: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_cost_std: f64,

    pub units: Vec<UnitObservation>,
}

impl PartGroup {
    pub fn new(part_id: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            ..Default::default()
        }
    }

    pub fn with_costs(mut self, mean: f64, std: f64) -> Self {
        self.unit_cost_mean = mean;
        self.unit_cost_std = std;
        self
    }

    pub fn with_unit(mut self, unit: UnitObservation) -> Self {
        self.units.push(unit);
        self
    }
}

/// Aggregate forecast for one part type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartTypeForecast {
    /// Number of units evaluated
    pub unit_count: usize,

    /// Sum of per-unit failure probabilities
    #[serde(rename = "count")]
    pub expected_replacement_count: f64,

    pub unit_cost_mean: f64,

    pub unit_cost_std: f64,

    /// `expected_replacement_count * unit_cost_mean`
    #[serde(rename = "total_cost")]
    pub expected_total_cost: f64,
}

impl PartTypeForecast {
    /// Cost bounds `count * (mean ± z * std)`, lower bound clamped at zero
    pub fn cost_interval(&self, z: f64) -> (f64, f64) {
        let spread = z * self.unit_cost_std;
        let low = self.expected_replacement_count * (self.unit_cost_mean - spread);
        let low = if low > 0.0 { low } else { 0.0 };
        let high = self.expected_replacement_count * (self.unit_cost_mean + spread);
        (low, high)
    }
}

/// Forecast over all part types of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetForecast {
    pub horizon_days: u32,
    pub horizon_hours: f64,
    pub policy: WindowPolicy,
    /// Part id -> forecast, in input order
    pub parts: IndexMap<String, PartTypeForecast>,
}

impl FleetForecast {
    /// Sum of expected total cost over all part types
    pub fn total_cost(&self) -> f64 {
        grand_total(self.parts.values())
    }

    /// Sum of expected replacement counts over all part types
    pub fn total_count(&self) -> f64 {
        self.parts
            .values()
            .fold(0.0, |acc, f| acc + f.expected_replacement_count)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::weibull::probability_of_failure_in_window;

    fn sample_units() -> Vec<UnitObservation> {
        vec![
            UnitObservation::new("SN-1", 2000.0, 1.5, 10_000.0),
            UnitObservation::new("SN-2", 9000.0, 1.5, 10_000.0),
            UnitObservation::new("SN-3", 0.0, 2.0, 8760.0),
            UnitObservation::new("SN-4", 500.0, 0.0, 8760.0),
        ]
    }

    #[test]
    fn test_empty_collection() {
        let forecast = aggregate_forecast(&[], 2160.0, 1_000_000.0, 10_000.0);
        assert_eq!(forecast.unit_count, 0);
        assert_eq!(forecast.expected_replacement_count, 0.0);
        assert_eq!(forecast.expected_total_cost, 0.0);
        assert!(forecast.expected_replacement_count.is_sign_positive());
        assert!(forecast.expected_total_cost.is_sign_positive());

        let json = serde_json::to_string(&forecast).expect("serialize");
        assert!(!json.contains("-0.0"), "{json}");
    }

    #[test]
    fn test_empty_fleet_totals_are_positive_zero() {
        let groups = vec![PartGroup::new("FAN").with_costs(50_000.0, 0.0)];
        let fleet = Estimator::default().forecast(&groups, HorizonWindow::from_days(90));
        assert!(fleet.total_count().is_sign_positive());
        assert!(fleet.total_cost().is_sign_positive());
        assert!(grand_total(std::iter::empty::<&PartTypeForecast>()).is_sign_positive());
    }

    #[test]
    fn test_repeated_part_id_keeps_first_costs() {
        let groups = vec![
            PartGroup::new("DCU")
                .with_costs(100.0, 5.0)
                .with_unit(UnitObservation::new("D-1", 1000.0, 1.2, 20_000.0)),
            PartGroup::new("DCU")
                .with_costs(900.0, 50.0)
                .with_unit(UnitObservation::new("D-2", 2000.0, 1.2, 20_000.0)),
        ];
        let fleet = Estimator::default().forecast(&groups, HorizonWindow::from_days(30));
        let dcu = &fleet.parts["DCU"];
        assert_eq!(dcu.unit_cost_mean, 100.0);
        assert_eq!(dcu.unit_cost_std, 5.0);
        assert!((dcu.expected_total_cost - dcu.expected_replacement_count * 100.0).abs() < 1e-12);
        assert!(!same_costs(
            &Estimator::default().aggregate(&groups[0].units, HorizonWindow::from_days(30), 100.0, 5.0),
            &Estimator::default().aggregate(&groups[1].units, HorizonWindow::from_days(30), 900.0, 50.0),
        ));
    }

    #[test]
    fn test_sum_law() {
        let units = sample_units();
        let forecast = aggregate_forecast(&units, 2160.0, 250_000.0, 0.0);
        let expected: f64 = units
            .iter()
            .map(|u| probability_of_failure_in_window(u.age_hours, u.eta, u.beta, 2160.0))
            .sum();
        assert_eq!(forecast.expected_replacement_count, expected);
        assert_eq!(forecast.expected_total_cost, expected * 250_000.0);
        assert_eq!(forecast.unit_count, 4);
    }

    #[test]
    fn test_aggregation_idempotent() {
        let units = sample_units();
        let a = aggregate_forecast(&units, 720.0, 1000.0, 50.0);
        let b = aggregate_forecast(&units, 720.0, 1000.0, 50.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_expected_cost_from_known_probabilities() {
        // Two units with window probabilities 0.3 and 0.45: choose ages so
        // that an exponential (beta = 1) unit has exactly the required mass.
        // For beta = 1 the conditional probability is 1 - exp(-H/eta).
        let horizon = 1000.0;
        let eta_for = |p: f64| -horizon / (1.0 - p).ln();
        let units = vec![
            UnitObservation::new("A", 0.0, 1.0, eta_for(0.3)),
            UnitObservation::new("B", 0.0, 1.0, eta_for(0.45)),
        ];

        let forecast = aggregate_forecast(&units, horizon, 1_000_000.0, 0.0);
        assert!((forecast.expected_replacement_count - 0.75).abs() < 1e-9);
        assert!((forecast.expected_total_cost - 750_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_fleet_forecast_preserves_order_and_totals() {
        let groups = vec![
            PartGroup::new("PUMP")
                .with_costs(500_000.0, 20_000.0)
                .with_unit(UnitObservation::new("P-1", 4000.0, 2.0, 8000.0)),
            PartGroup::new("DCU")
                .with_costs(1_000_000.0, 0.0)
                .with_unit(UnitObservation::new("D-1", 1000.0, 1.2, 20_000.0))
                .with_unit(UnitObservation::new("D-2", 6000.0, 1.2, 20_000.0)),
            PartGroup::new("FAN").with_costs(80_000.0, 0.0),
        ];

        let fleet = Estimator::default().forecast(&groups, HorizonWindow::from_days(90));
        let keys: Vec<&str> = fleet.parts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["PUMP", "DCU", "FAN"]);
        assert_eq!(fleet.horizon_days, 90);
        assert_eq!(fleet.horizon_hours, 2160.0);

        let manual: f64 = fleet.parts.values().map(|f| f.expected_total_cost).sum();
        assert_eq!(fleet.total_cost(), manual);
        assert_eq!(fleet.parts["FAN"].expected_total_cost, 0.0);
        assert!(fleet.total_count() > 0.0);
    }

    #[test]
    fn test_fleet_forecast_merges_repeated_part_ids() {
        let groups = vec![
            PartGroup::new("DCU")
                .with_costs(100.0, 0.0)
                .with_unit(UnitObservation::new("D-1", 1000.0, 1.2, 20_000.0)),
            PartGroup::new("DCU")
                .with_costs(100.0, 0.0)
                .with_unit(UnitObservation::new("D-2", 2000.0, 1.2, 20_000.0)),
        ];
        let horizon = HorizonWindow::from_days(30);
        let fleet = Estimator::default().forecast(&groups, horizon);
        assert_eq!(fleet.parts.len(), 1);
        assert_eq!(fleet.parts["DCU"].unit_count, 2);

        let all_units: Vec<UnitObservation> =
            groups.iter().flat_map(|g| g.units.clone()).collect();
        let direct = Estimator::default().aggregate(&all_units, horizon, 100.0, 0.0);
        assert!((fleet.parts["DCU"].expected_replacement_count - direct.expected_replacement_count).abs() < 1e-15);
    }

    #[test]
    fn test_policy_changes_counts() {
        let units = vec![UnitObservation::new("OLD", 15_000.0, 2.0, 10_000.0)];
        let horizon = HorizonWindow::from_days(90);
        let conditional = Estimator::new(WindowPolicy::Conditional).aggregate(&units, horizon, 1.0, 0.0);
        let unconditional = Estimator::new(WindowPolicy::Unconditional).aggregate(&units, horizon, 1.0, 0.0);
        assert!(conditional.expected_replacement_count > unconditional.expected_replacement_count);
    }

    #[test]
    fn test_cost_interval() {
        let forecast = PartTypeForecast {
            unit_count: 2,
            expected_replacement_count: 0.5,
            unit_cost_mean: 1000.0,
            unit_cost_std: 100.0,
            expected_total_cost: 500.0,
        };
        let (low, high) = forecast.cost_interval(Z_95);
        assert!((low - 0.5 * (1000.0 - 196.0)).abs() < 1e-9);
        assert!((high - 0.5 * (1000.0 + 196.0)).abs() < 1e-9);

        let wide = PartTypeForecast {
            unit_cost_std: 10_000.0,
            ..forecast
        };
        assert_eq!(wide.cost_interval(Z_95).0, 0.0);
        assert!(wide.cost_interval(Z_95).0.is_sign_positive());
    }

    #[test]
    fn test_forecast_serializes_with_short_names() {
        let forecast = aggregate_forecast(&[], 24.0, 10.0, 1.0);
        let json = serde_json::to_value(&forecast).expect("serialize");
        assert!(json.get("count").is_some());
        assert!(json.get("total_cost").is_some());
        assert!(json.get("expected_total_cost").is_none());
    }
}
