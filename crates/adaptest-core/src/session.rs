//! Adaptive test session state.
//!
//! A session exclusively owns one ability estimate, one optional
//! blueprint state, and the ordered response history. The caller drives
//! the loop: ask for the next item, administer it externally, record the
//! scored response, repeat until a stop rule fires. Exposure tracking is
//! injected per call so a tracker can be scoped to the session or shared
//! across sessions by the surrounding service layer.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blueprint::BlueprintState;
use crate::estimator::MapEstimator;
use crate::exposure::ExposureTracker;
use crate::model::{AbilityEstimate, Item, ItemBank, ItemId, ParameterTable, ResponseRecord};
use crate::selector::ItemSelector;

/// Stop rules evaluated before each selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard cap on administered items, independent of the blueprint.
    pub max_items: Option<usize>,
    /// Stop once the SE drops below this threshold.
    pub se_threshold: Option<f64>,
    /// Stop once consecutive theta updates differ by less than this.
    pub theta_convergence_eps: Option<f64>,
    /// Precision/convergence rules only fire after this many responses.
    pub min_items: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            se_threshold: Some(0.25),
            theta_convergence_eps: None,
            min_items: 3,
        }
    }
}

/// Why a session stopped handing out items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The blueprint's total length has been served.
    BlueprintSatisfied,
    /// No eligible item remains in the bank.
    BankExhausted,
    /// The standard error fell below the configured threshold.
    SeBelowThreshold,
    /// Consecutive theta estimates converged.
    ThetaConverged,
    /// The configured item cap was reached.
    MaxItemsReached,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::BlueprintSatisfied => write!(f, "blueprint satisfied"),
            StopReason::BankExhausted => write!(f, "bank exhausted"),
            StopReason::SeBelowThreshold => write!(f, "standard error below threshold"),
            StopReason::ThetaConverged => write!(f, "theta converged"),
            StopReason::MaxItemsReached => write!(f, "maximum items reached"),
        }
    }
}

/// Per-skill outcome counts for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub skill: String,
    pub served: usize,
    pub correct: usize,
}

/// End-of-session summary handed to the report service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub items_served: usize,
    pub ability: AbilityEstimate,
    pub stop_reason: Option<StopReason>,
    pub skills: Vec<SkillOutcome>,
}

/// One adaptive test session.
pub struct TestSession {
    id: Uuid,
    config: SessionConfig,
    estimator: MapEstimator,
    selector: ItemSelector,
    blueprint: Option<BlueprintState>,
    focus_skill: Option<String>,
    ability: AbilityEstimate,
    previous_theta: Option<f64>,
    asked: HashSet<ItemId>,
    history: Vec<ResponseRecord>,
    stop: Option<StopReason>,
}

impl TestSession {
    pub fn new(
        config: SessionConfig,
        estimator: MapEstimator,
        selector: ItemSelector,
        blueprint: Option<BlueprintState>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            estimator,
            selector,
            blueprint,
            focus_skill: None,
            ability: AbilityEstimate::default(),
            previous_theta: None,
            asked: HashSet::new(),
            history: Vec::new(),
            stop: None,
        }
    }

    /// Restrict selection emphasis to one skill.
    pub fn with_focus_skill(mut self, skill: impl Into<String>) -> Self {
        self.focus_skill = Some(skill.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn ability(&self) -> AbilityEstimate {
        self.ability
    }

    pub fn history(&self) -> &[ResponseRecord] {
        &self.history
    }

    pub fn items_served(&self) -> usize {
        self.history.len()
    }

    pub fn blueprint(&self) -> Option<&BlueprintState> {
        self.blueprint.as_ref()
    }

    /// The stop reason, once a stop rule has fired.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Select the next item, or `None` once the session is over.
    ///
    /// Returning `None` is a first-class outcome, not an error; after it
    /// the stop reason is set and further calls keep returning `None`.
    pub fn next_item<'a>(
        &mut self,
        bank: &'a ItemBank,
        params: &ParameterTable,
        exposure: &mut ExposureTracker,
    ) -> Option<&'a Item> {
        if self.stop.is_some() {
            return None;
        }
        if let Some(reason) = self.check_stop() {
            self.stop = Some(reason);
            tracing::debug!(session = %self.id, %reason, "session stopped");
            return None;
        }

        match self.selector.select_next(
            self.ability.theta,
            bank,
            params,
            &self.asked,
            self.blueprint.as_mut(),
            exposure,
            &self.history,
            self.focus_skill.as_deref(),
        ) {
            Some(item) => {
                self.asked.insert(item.id.clone());
                Some(item)
            }
            None => {
                let reason = if self.blueprint.as_ref().is_some_and(|b| b.should_stop()) {
                    StopReason::BlueprintSatisfied
                } else {
                    StopReason::BankExhausted
                };
                self.stop = Some(reason);
                tracing::debug!(session = %self.id, %reason, "session stopped");
                None
            }
        }
    }

    /// Record a scored response and apply one MAP update over the full
    /// history. Returns the refreshed estimate.
    pub fn record_response(
        &mut self,
        item_id: ItemId,
        correct: bool,
        params: &ParameterTable,
    ) -> AbilityEstimate {
        self.history.push(ResponseRecord { item_id, correct });
        self.previous_theta = Some(self.ability.theta);
        self.ability = self
            .estimator
            .update(self.ability.theta, &self.history, params);
        self.ability
    }

    fn check_stop(&self) -> Option<StopReason> {
        if let Some(state) = &self.blueprint {
            if state.should_stop() {
                return Some(StopReason::BlueprintSatisfied);
            }
        }
        if let Some(max) = self.config.max_items {
            if self.history.len() >= max {
                return Some(StopReason::MaxItemsReached);
            }
        }
        if self.history.len() >= self.config.min_items {
            if let Some(threshold) = self.config.se_threshold {
                if self.ability.is_precise(threshold) {
                    return Some(StopReason::SeBelowThreshold);
                }
            }
            if let (Some(eps), Some(previous)) =
                (self.config.theta_convergence_eps, self.previous_theta)
            {
                if (self.ability.theta - previous).abs() < eps {
                    return Some(StopReason::ThetaConverged);
                }
            }
        }
        None
    }

    /// Build the end-of-session summary, resolving skills via the bank.
    pub fn summary(&self, bank: &ItemBank) -> SessionSummary {
        let mut by_skill: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for record in &self.history {
            let Some(item) = bank.get(&record.item_id) else {
                continue;
            };
            let entry = by_skill.entry(item.skill.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if record.correct {
                entry.1 += 1;
            }
        }
        SessionSummary {
            session_id: self.id,
            items_served: self.history.len(),
            ability: self.ability,
            stop_reason: self.stop,
            skills: by_skill
                .into_iter()
                .map(|(skill, (served, correct))| SkillOutcome {
                    skill: skill.to_string(),
                    served,
                    correct,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{default_blueprint, BlueprintSpec, DifficultyMix, DomainSpec, SkillSpec};
    use crate::model::{Difficulty, IrtParameters};
    use crate::selector::SelectorConfig;
    use std::collections::HashMap;

    fn bank_and_params(n: usize) -> (ItemBank, ParameterTable) {
        let mut items = Vec::new();
        let mut params = ParameterTable::new();
        for i in 0..n {
            let id = ItemId::new(format!("q{i}"));
            let b = (i as f64 / n as f64) * 4.0 - 2.0;
            items.push(Item {
                id: id.clone(),
                domain: if i % 2 == 0 { "Math" } else { "Reading & Writing" }.into(),
                skill: match i % 3 {
                    0 => "Algebra",
                    1 => "Grammar",
                    _ => "Vocabulary",
                }
                .into(),
                difficulty: Difficulty::from_b(b),
                stem: format!("stem {i}"),
                options: vec![],
                answer_key: "A".into(),
                stimulus: None,
            });
            params.insert(id, IrtParameters::new(1.2, b, 0.2));
        }
        (ItemBank::new(items), params)
    }

    fn session(config: SessionConfig, blueprint: Option<BlueprintState>) -> TestSession {
        TestSession::new(
            config,
            MapEstimator::default(),
            ItemSelector::with_seed(SelectorConfig::default(), 99),
            blueprint,
        )
    }

    #[test]
    fn full_loop_stops_at_max_items() {
        let (bank, params) = bank_and_params(30);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: Some(5),
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            None,
        );

        let mut served = 0;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, served % 2 == 0, &params);
            served += 1;
        }
        assert_eq!(served, 5);
        assert_eq!(sess.stop_reason(), Some(StopReason::MaxItemsReached));
    }

    #[test]
    fn stops_when_se_threshold_reached() {
        let (bank, params) = bank_and_params(60);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: None,
                se_threshold: Some(0.45),
                theta_convergence_eps: None,
                min_items: 3,
            },
            None,
        );

        let mut alternate = false;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            alternate = !alternate;
            sess.record_response(id, alternate, &params);
        }
        assert_eq!(sess.stop_reason(), Some(StopReason::SeBelowThreshold));
        assert!(sess.ability().se < 0.45);
        assert!(sess.items_served() >= 3);
    }

    #[test]
    fn stops_when_bank_exhausted() {
        let (bank, params) = bank_and_params(4);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: None,
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            None,
        );
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, true, &params);
        }
        assert_eq!(sess.stop_reason(), Some(StopReason::BankExhausted));
        assert_eq!(sess.items_served(), 4);
    }

    #[test]
    fn blueprint_length_bounds_the_session() {
        let (bank, params) = bank_and_params(40);
        let domains: HashMap<String, DomainSpec> = [
            (
                "Math".to_string(),
                DomainSpec::new(
                    0.5,
                    [(
                        "Algebra".to_string(),
                        SkillSpec::new(1.0, DifficultyMix::new(0.4, 0.4, 0.2)),
                    )]
                    .into_iter()
                    .collect(),
                ),
            ),
            (
                "Reading & Writing".to_string(),
                DomainSpec::new(
                    0.5,
                    [(
                        "Grammar".to_string(),
                        SkillSpec::new(1.0, DifficultyMix::new(0.4, 0.4, 0.2)),
                    )]
                    .into_iter()
                    .collect(),
                ),
            ),
        ]
        .into_iter()
        .collect();
        let state = BlueprintState::new(BlueprintSpec::new(domains, 6).unwrap());

        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: None,
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            Some(state),
        );
        let mut served = 0;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, served % 2 == 0, &params);
            served += 1;
        }
        assert_eq!(served, 6);
        assert_eq!(sess.stop_reason(), Some(StopReason::BlueprintSatisfied));
    }

    #[test]
    fn next_item_keeps_returning_none_after_stop() {
        let (bank, params) = bank_and_params(2);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(SessionConfig::default(), None);
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, true, &params);
        }
        assert!(sess.next_item(&bank, &params, &mut exposure).is_none());
        assert!(sess.next_item(&bank, &params, &mut exposure).is_none());
    }

    #[test]
    fn summary_counts_skills() {
        let (bank, params) = bank_and_params(12);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: Some(6),
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            None,
        );
        let mut flip = false;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            flip = !flip;
            sess.record_response(id, flip, &params);
        }

        let summary = sess.summary(&bank);
        assert_eq!(summary.items_served, 6);
        assert_eq!(
            summary.skills.iter().map(|s| s.served).sum::<usize>(),
            6
        );
        assert!(summary
            .skills
            .iter()
            .all(|s| s.correct <= s.served));
        assert_eq!(summary.stop_reason, Some(StopReason::MaxItemsReached));
    }

    #[test]
    fn theta_convergence_rule_fires() {
        let (bank, params) = bank_and_params(50);
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: None,
                se_threshold: None,
                theta_convergence_eps: Some(5.0),
                min_items: 2,
            },
            None,
        );
        // An epsilon this wide triggers as soon as min_items is met.
        let mut served = 0;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, true, &params);
            served += 1;
        }
        assert_eq!(served, 2);
        assert_eq!(sess.stop_reason(), Some(StopReason::ThetaConverged));
    }

    #[test]
    fn focus_skill_threaded_through_selection() {
        let (bank, params) = bank_and_params(30);
        let mut exposure = ExposureTracker::new();
        let mut sess = TestSession::new(
            SessionConfig {
                max_items: Some(5),
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            MapEstimator::default(),
            ItemSelector::with_seed(
                SelectorConfig {
                    top_k: 1,
                    focus_discount: 0.0,
                    ..SelectorConfig::default()
                },
                7,
            ),
            None,
        )
        .with_focus_skill("Grammar");

        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            assert_eq!(item.skill, "Grammar");
            let id = item.id.clone();
            sess.record_response(id, true, &params);
        }
    }

    #[test]
    fn default_blueprint_session_reaches_length() {
        let (bank, params) = bank_and_params(200);
        let state = BlueprintState::new(default_blueprint(10).unwrap());
        let mut exposure = ExposureTracker::new();
        let mut sess = session(
            SessionConfig {
                max_items: None,
                se_threshold: None,
                theta_convergence_eps: None,
                min_items: 3,
            },
            Some(state),
        );
        let mut served = 0;
        while let Some(item) = sess.next_item(&bank, &params, &mut exposure) {
            let id = item.id.clone();
            sess.record_response(id, served % 3 != 0, &params);
            served += 1;
        }
        assert_eq!(served, 10);
    }
}
