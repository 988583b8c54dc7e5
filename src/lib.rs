//! PCF: Parts Cycle Forecast
//!
//! Weibull-based failure probability ranking and replacement cost
//! forecasting for serial-numbered parts in service.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
