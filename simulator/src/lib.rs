//! # Traffic Simulator
//!
//! Produces an unending sequence of synthetic log events: a stationary
//! background mixture (mostly informational, occasional warnings, rare
//! errors) punctuated by randomly triggered incident bursts of correlated
//! errors on one service. Used to exercise the analysis pipeline in tests
//! and demos.

pub mod model;
pub mod runner;
pub mod sink;

pub use model::{Emission, IncidentState, Mode};
pub use runner::TrafficSimulator;
pub use sink::{HttpSink, LogSink, StoreSink};
