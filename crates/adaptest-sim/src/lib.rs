//! adaptest-sim — Monte Carlo simulation of adaptive test sessions.
//!
//! Simulated respondents with known true abilities take tests against a
//! real bank, which makes estimation bias, measurement precision, and
//! exposure behavior directly observable. Sessions run concurrently over
//! one shared exposure tracker, matching a multi-examinee deployment.

pub mod engine;
pub mod report;
pub mod respondent;

pub use engine::{NoopProgress, SimProgress, SimulationConfig, SimulationEngine};
pub use report::{compute_aggregate, AggregateStats, SessionOutcome, SimulationReport};
pub use respondent::SimulatedRespondent;
