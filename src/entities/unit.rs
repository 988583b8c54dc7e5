//! Unit observation and forecast horizon
//!
//! A unit is one serial-numbered part currently in service, carrying the
//! Weibull parameters fitted for its part type.

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::weibull::{window_probability, WeibullParams, WindowPolicy, MIN_HORIZON_HOURS};

/// Hours per forecast day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Horizon lengths offered by default, in days
pub const STANDARD_HORIZON_DAYS: [u32; 4] = [30, 60, 90, 180];

/// One in-service unit of a part type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitObservation {
    /// Serial number
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial: String,

    /// Elapsed operating time in hours
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age_hours: f64,

    /// Weibull shape parameter
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beta: f64,

    /// Weibull scale parameter in hours
    #[serde(default, deserialize_with = "lenient_f64")]
    pub eta: f64,
}

impl UnitObservation {
    pub fn new(serial: impl Into<String>, age_hours: f64, beta: f64, eta: f64) -> Self {
        Self {
            serial: serial.into(),
            age_hours,
            beta,
            eta,
        }
    }

    /// Validated parameters, if this unit has usable ones
    pub fn params(&self) -> Option<WeibullParams> {
        WeibullParams::new(self.beta, self.eta)
    }

    /// Failure probability over `horizon` under `policy`
    pub fn failure_probability(&self, horizon: HorizonWindow, policy: WindowPolicy) -> f64 {
        window_probability(self.age_hours, self.eta, self.beta, horizon.hours(), policy)
    }
}

/// Forward-looking forecast window in hours (at least one hour)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonWindow {
    hours: f64,
}

impl HorizonWindow {
    pub fn from_days(days: u32) -> Self {
        Self::from_hours(f64::from(days) * HOURS_PER_DAY)
    }

    pub fn from_hours(hours: f64) -> Self {
        Self {
            hours: hours.max(MIN_HORIZON_HOURS),
        }
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    /// Whole days covered, rounded down
    pub fn days(&self) -> u32 {
        (self.hours / HOURS_PER_DAY).floor() as u32
    }
}

impl Default for HorizonWindow {
    fn default() -> Self {
        Self::from_days(90)
    }
}

/// Raw numeric field as found in snapshot files
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Coerce a finite number from a loosely typed value
///
/// Numbers pass through, numeric strings are parsed, and anything else
/// (null, booleans, garbage, NaN, infinities) becomes `0.0`.
pub fn coerce_f64(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match LooseNumber::deserialize(deserializer)? {
        LooseNumber::Number(n) if n.is_finite() => n,
        LooseNumber::Number(_) => 0.0,
        LooseNumber::Text(s) => coerce_f64(&s),
        LooseNumber::Other(_) => 0.0,
    };
    Ok(value)
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseText {
        Text(String),
        Number(f64),
        Other(serde::de::IgnoredAny),
    }

    let value = match LooseText::deserialize(deserializer)? {
        LooseText::Text(s) => s,
        LooseText::Number(n) => n.to_string(),
        LooseText::Other(_) => String::new(),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_from_days() {
        assert_eq!(HorizonWindow::from_days(90).hours(), 2160.0);
        assert_eq!(HorizonWindow::from_days(30).days(), 30);
        assert_eq!(HorizonWindow::from_days(0).hours(), 1.0);
        assert_eq!(HorizonWindow::default().days(), 90);
    }

    #[test]
    fn test_horizon_from_hours_floor() {
        assert_eq!(HorizonWindow::from_hours(0.25).hours(), 1.0);
        assert_eq!(HorizonWindow::from_hours(-10.0).hours(), 1.0);
        assert_eq!(HorizonWindow::from_hours(f64::NAN).hours(), 1.0);
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(coerce_f64("12.5"), 12.5);
        assert_eq!(coerce_f64("  7 "), 7.0);
        assert_eq!(coerce_f64(""), 0.0);
        assert_eq!(coerce_f64("abc"), 0.0);
        assert_eq!(coerce_f64("NaN"), 0.0);
        assert_eq!(coerce_f64("inf"), 0.0);
    }

    #[test]
    fn test_lenient_deserialization_json() {
        let json = r#"{"serial": "SN-1", "age_hours": "1200", "beta": null, "eta": 5000}"#;
        let unit: UnitObservation = serde_json::from_str(json).expect("lenient parse");
        assert_eq!(unit.serial, "SN-1");
        assert_eq!(unit.age_hours, 1200.0);
        assert_eq!(unit.beta, 0.0);
        assert_eq!(unit.eta, 5000.0);
    }

    #[test]
    fn test_lenient_deserialization_missing_fields() {
        let unit: UnitObservation = serde_json::from_str(r#"{"serial": 42}"#).expect("lenient parse");
        assert_eq!(unit.serial, "42");
        assert_eq!(unit.age_hours, 0.0);
        assert_eq!(unit.beta, 0.0);
        assert_eq!(unit.eta, 0.0);
        assert!(unit.params().is_none());
    }

    #[test]
    fn test_lenient_deserialization_yaml() {
        let yaml = "serial: A-7\nage_hours: n/a\nbeta: 1.5\neta: '10000'\n";
        let unit: UnitObservation = serde_yml::from_str(yaml).expect("lenient parse");
        assert_eq!(unit.age_hours, 0.0);
        assert_eq!(unit.beta, 1.5);
        assert_eq!(unit.eta, 10_000.0);
    }

    #[test]
    fn test_failure_probability_uses_unit_fields() {
        let unit = UnitObservation::new("SN-1", 2000.0, 1.5, 10_000.0);
        let horizon = HorizonWindow::from_days(90);
        let p = unit.failure_probability(horizon, WindowPolicy::Conditional);
        let direct = crate::core::weibull::probability_of_failure_in_window(2000.0, 10_000.0, 1.5, 2160.0);
        assert_eq!(p, direct);
    }
}
