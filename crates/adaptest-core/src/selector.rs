//! Adaptive item selection.
//!
//! Ranks candidate items by Fisher information at the current ability
//! estimate, weighted by difficulty fit and skill weakness, subject to
//! blueprint quota and exposure control. The final pick is uniform among
//! the top-k scored candidates: controlled randomization keeps the item
//! sequence from being deterministic and gameable while still strongly
//! favoring high-information items.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::blueprint::BlueprintState;
use crate::exposure::ExposureTracker;
use crate::irt;
use crate::model::{Item, ItemBank, ItemId, ParameterTable, ResponseRecord};

/// Tunable weights and limits for item selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Items at or above this exposure fraction are filtered out.
    pub exposure_limit: f64,
    /// Size of the top-scored pool the final pick is drawn from.
    pub top_k: usize,
    /// Additive boost per wrong answer previously given in a skill.
    pub weakness_gain: f64,
    /// Multiplier applied to skills other than the focus skill.
    pub focus_discount: f64,
    /// Multiplier applied to the skill of the immediately preceding
    /// item; 1.0 disables the variety cooldown.
    pub variety_cooldown: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            exposure_limit: 0.30,
            top_k: 4,
            weakness_gain: 0.5,
            focus_discount: 0.5,
            variety_cooldown: 1.0,
        }
    }
}

/// Seedable adaptive item selector.
///
/// Holds its own RNG so repeated sessions can be made reproducible
/// without touching global random state.
#[derive(Debug, Clone)]
pub struct ItemSelector {
    config: SelectorConfig,
    rng: StdRng,
}

impl ItemSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(config: SelectorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Choose the next item to administer, or `None` when the session
    /// should stop (blueprint satisfied or bank exhausted).
    ///
    /// The caller owns the exclusion set: selected items are not added to
    /// `asked` here. On a successful pick the blueprint counters (when a
    /// state is supplied) and the item's exposure are updated.
    #[allow(clippy::too_many_arguments)]
    pub fn select_next<'a>(
        &mut self,
        theta: f64,
        bank: &'a ItemBank,
        params: &ParameterTable,
        asked: &HashSet<ItemId>,
        mut blueprint: Option<&mut BlueprintState>,
        exposure: &mut ExposureTracker,
        history: &[ResponseRecord],
        focus_skill: Option<&str>,
    ) -> Option<&'a Item> {
        if let Some(state) = blueprint.as_deref() {
            if state.should_stop() {
                tracing::debug!(
                    served = state.total_served(),
                    "blueprint length reached, stopping selection"
                );
                return None;
            }
        }

        let wrong_by_skill = wrong_counts_by_skill(bank, history);
        let previous_skill: Option<&str> = history
            .last()
            .and_then(|record| bank.get(&record.item_id))
            .map(|item| item.skill.as_str());

        let mut candidates: Vec<(f64, &'a Item)> = Vec::new();
        for item in bank.iter() {
            if asked.contains(&item.id) {
                continue;
            }
            let Some(&pars) = params.get(&item.id) else {
                continue;
            };
            if exposure.exposure(&item.id) >= self.config.exposure_limit {
                continue;
            }
            if let Some(state) = blueprint.as_deref() {
                if !state.is_eligible(&item.domain, &item.skill, item.difficulty) {
                    continue;
                }
            }

            // Zero-information items score 0.0 and lose to anything
            // informative, but stay in the pool: a bank with nothing
            // informative left still serves rather than ending the test.
            let info = irt::fisher_info(theta, pars);
            let difficulty_fit = 1.0 / (1.0 + (theta - pars.b).abs());
            let weight = self.skill_weight(
                &item.skill,
                &wrong_by_skill,
                focus_skill,
                previous_skill,
            );
            candidates.push((info * difficulty_fit * weight, item));
        }

        // Completeness over fidelity: rather than starving the test when
        // the ideal content distribution cannot be hit, retry on Fisher
        // information alone without blueprint or exposure constraints.
        if candidates.is_empty() && blueprint.is_some() {
            tracing::debug!("no candidate satisfies blueprint constraints, ranking by information only");
            for item in bank.iter() {
                if asked.contains(&item.id) {
                    continue;
                }
                let Some(&pars) = params.get(&item.id) else {
                    continue;
                };
                candidates.push((irt::fisher_info(theta, pars), item));
            }
        }

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|x, y| y.0.partial_cmp(&x.0).unwrap_or(std::cmp::Ordering::Equal));
        let k = self.config.top_k.clamp(1, candidates.len());
        let &(score, chosen) = candidates[..k].choose(&mut self.rng)?;

        if let Some(state) = blueprint.as_deref_mut() {
            state.record_serve(&chosen.domain, &chosen.skill, chosen.difficulty);
        }
        let new_exposure = exposure.record_serve(&chosen.id);
        tracing::debug!(
            item = %chosen.id,
            skill = %chosen.skill,
            score,
            exposure = new_exposure,
            "selected next item"
        );
        Some(chosen)
    }

    fn skill_weight(
        &self,
        skill: &str,
        wrong_by_skill: &HashMap<&str, u32>,
        focus_skill: Option<&str>,
        previous_skill: Option<&str>,
    ) -> f64 {
        let wrong = wrong_by_skill.get(skill).copied().unwrap_or(0);
        let mut weight = 1.0 + self.config.weakness_gain * f64::from(wrong);
        if let Some(focus) = focus_skill {
            if focus != skill {
                weight *= self.config.focus_discount;
            }
        }
        if previous_skill == Some(skill) {
            weight *= self.config.variety_cooldown;
        }
        weight
    }
}

/// Count wrong answers per skill over the response history. Records whose
/// item is no longer in the bank are ignored.
fn wrong_counts_by_skill<'a>(
    bank: &'a ItemBank,
    history: &[ResponseRecord],
) -> HashMap<&'a str, u32> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for record in history {
        if record.correct {
            continue;
        }
        if let Some(item) = bank.get(&record.item_id) {
            *counts.entry(item.skill.as_str()).or_insert(0) += 1;
        }
    }
    counts
}
