//! adaptest-core — IRT estimation engine and adaptive item selection.
//!
//! This crate implements the algorithmic heart of adaptest: the 3PL
//! probability model, Fisher-information item ranking, one-step MAP
//! ability estimation, blueprint quota balancing, exposure control,
//! and the adaptive test-session loop that ties them together.

pub mod blueprint;
pub mod error;
pub mod estimator;
pub mod exposure;
pub mod irt;
pub mod model;
pub mod selector;
pub mod session;
pub mod traits;
