//! adaptest-services — explanation and report service implementations.
//!
//! The core treats these services as opaque collaborators behind the
//! traits in `adaptest_core::traits`. This crate ships mock
//! implementations used by tests, simulations, and the CLI; production
//! deployments inject their own backends at the same seams.

pub mod mock;

pub use mock::{MockExplanationService, MockReportService};
