//! Forecast domain types

pub mod forecast;
pub mod ranking;
pub mod strategy;
pub mod unit;

pub use forecast::{aggregate_forecast, grand_total, Estimator, FleetForecast, PartGroup, PartTypeForecast};
pub use ranking::{rank_by_probability, RankOptions, RankedUnit};
pub use strategy::{StrategyComparison, StrategyCost, StrategyInputs};
pub use unit::{HorizonWindow, UnitObservation};
