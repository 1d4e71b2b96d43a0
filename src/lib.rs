//! Multi-timeframe crypto price forecasting engine.
//!
//! Candles come in through [`services`], are turned into the fixed 15-column
//! feature set by [`features`], scaled and windowed by [`pipeline`], and run
//! through whichever model the registry holds for the timeframe. The
//! [`core`] scheduler sweeps every coin on a timer and appends each forecast
//! to the [`db`] ledger.

pub mod common;
pub mod config;
pub mod core;
pub mod db;
pub mod features;
pub mod indicators;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;
