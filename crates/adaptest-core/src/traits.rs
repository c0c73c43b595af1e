//! Service trait seams for explanation and report generation.
//!
//! The engine treats these collaborators as black boxes: an explanation
//! is requested after each scoring step and a report at session end, by
//! the orchestration layer around the synchronous core loop. Real
//! implementations live outside this crate; `adaptest-services` ships
//! mocks for tests and simulations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AbilityEstimate, ItemId};
use crate::session::SessionSummary;

/// Request for a post-response explanation of one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub item_id: ItemId,
    /// The question text.
    pub stem: String,
    /// Id of the correct choice.
    pub correct_choice: String,
    /// Whether the test-taker answered correctly.
    pub answered_correctly: bool,
    /// Ability estimate after scoring this response.
    pub ability: AbilityEstimate,
}

/// An explanation produced by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub text: String,
}

/// Generates natural-language explanations for scored responses.
#[async_trait]
pub trait ExplanationService: Send + Sync {
    /// Human-readable service name.
    fn name(&self) -> &str;

    async fn explain(&self, request: &ExplanationRequest) -> anyhow::Result<Explanation>;
}

/// Request for an end-of-session performance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub summary: SessionSummary,
}

/// A performance report produced by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub text: String,
}

/// Generates end-of-session performance reports.
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Human-readable service name.
    fn name(&self) -> &str;

    async fn generate(&self, request: &ReportRequest) -> anyhow::Result<Report>;
}
