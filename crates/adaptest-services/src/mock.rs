//! Mock services for testing and simulation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use adaptest_core::traits::{
    Explanation, ExplanationRequest, ExplanationService, Report, ReportRequest, ReportService,
};

/// A mock explanation service that never calls an external backend.
///
/// Returns configurable responses based on stem content matching.
pub struct MockExplanationService {
    /// Map of stem substring → explanation text.
    responses: HashMap<String, String>,
    /// Default text if no stem matches.
    default_response: String,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ExplanationRequest>>,
}

impl MockExplanationService {
    /// Create a mock with the given stem→explanation mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "The keyed choice is correct.".to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: response.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of explanations requested so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this service.
    pub fn last_request(&self) -> Option<ExplanationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl Default for MockExplanationService {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl ExplanationService for MockExplanationService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn explain(&self, request: &ExplanationRequest) -> anyhow::Result<Explanation> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let text = self
            .responses
            .iter()
            .find(|(key, _)| request.stem.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        debug!(
            item = %request.item_id,
            correct = request.answered_correctly,
            "serving mock explanation"
        );
        Ok(Explanation { text })
    }
}

/// A mock report service that renders a plain-text performance summary.
pub struct MockReportService {
    call_count: AtomicU32,
    last_request: Mutex<Option<ReportRequest>>,
}

impl MockReportService {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ReportRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl Default for MockReportService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportService for MockReportService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &ReportRequest) -> anyhow::Result<Report> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let summary = &request.summary;
        let mut text = format!(
            "Session {}: {} items, theta {:.2}",
            summary.session_id, summary.items_served, summary.ability.theta
        );
        if summary.ability.se.is_finite() {
            text.push_str(&format!(" (SE {:.2})", summary.ability.se));
        }
        for skill in &summary.skills {
            text.push_str(&format!(
                "\n  {}: {}/{} correct",
                skill.skill, skill.correct, skill.served
            ));
        }
        debug!(
            session = %summary.session_id,
            items = summary.items_served,
            "rendering mock report"
        );
        Ok(Report { text })
    }
}
