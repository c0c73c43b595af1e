//! Blueprint content-distribution policy.
//!
//! A blueprint declares target proportions across the content taxonomy
//! (domain -> skill -> difficulty) plus a total test length. Targets are
//! allocated proportionally with floor rounding at each level, so they
//! are soft lower bounds: the fractional remainders lost to flooring are
//! compensated by the selector's fallback path. The runtime state mirrors
//! the taxonomy with served counters that are incremented exactly once
//! per served item and never decremented.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::BlueprintError;
use crate::model::Difficulty;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Target proportions of easy/medium/hard items within one skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyMix {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultyMix {
    pub fn new(easy: f64, medium: f64, hard: f64) -> Self {
        Self { easy, medium, hard }
    }

    fn sum(&self) -> f64 {
        self.easy + self.medium + self.hard
    }

    fn get(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Per-skill targets: share of the domain plus a difficulty mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSpec {
    /// Share of the skill within its domain; skill weights sum to 1
    /// within a domain.
    pub weight: f64,
    pub difficulty: DifficultyMix,
}

impl SkillSpec {
    pub fn new(weight: f64, difficulty: DifficultyMix) -> Self {
        Self { weight, difficulty }
    }
}

/// Per-domain targets: share of the test plus the skill layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSpec {
    /// Share of the domain within the test; domain weights sum to 1.
    pub weight: f64,
    pub skills: HashMap<String, SkillSpec>,
}

impl DomainSpec {
    pub fn new(weight: f64, skills: HashMap<String, SkillSpec>) -> Self {
        Self { weight, skills }
    }
}

/// A validated, immutable test blueprint.
///
/// Construction fails fast on structural mistakes (weights not summing
/// to 1, zero length, empty domains or skills); everything downstream
/// can then assume a well-formed taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlueprintSpec {
    domains: HashMap<String, DomainSpec>,
    length: usize,
}

impl BlueprintSpec {
    pub fn new(
        domains: HashMap<String, DomainSpec>,
        length: usize,
    ) -> Result<Self, BlueprintError> {
        if length == 0 {
            return Err(BlueprintError::ZeroLength);
        }
        if domains.is_empty() {
            return Err(BlueprintError::NoDomains);
        }

        let mut domain_sum = 0.0;
        for (domain_name, domain) in &domains {
            if domain.weight < 0.0 {
                return Err(BlueprintError::NegativeWeight {
                    scope: format!("domain '{domain_name}'"),
                    weight: domain.weight,
                });
            }
            domain_sum += domain.weight;

            if domain.skills.is_empty() {
                return Err(BlueprintError::NoSkills {
                    domain: domain_name.clone(),
                });
            }

            let mut skill_sum = 0.0;
            for (skill_name, skill) in &domain.skills {
                if skill.weight < 0.0 {
                    return Err(BlueprintError::NegativeWeight {
                        scope: format!("skill '{domain_name}/{skill_name}'"),
                        weight: skill.weight,
                    });
                }
                skill_sum += skill.weight;

                for difficulty in Difficulty::ALL {
                    let w = skill.difficulty.get(difficulty);
                    if w < 0.0 {
                        return Err(BlueprintError::NegativeWeight {
                            scope: format!(
                                "difficulty '{difficulty}' of '{domain_name}/{skill_name}'"
                            ),
                            weight: w,
                        });
                    }
                }
                let mix_sum = skill.difficulty.sum();
                if (mix_sum - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(BlueprintError::DifficultyMixSum {
                        domain: domain_name.clone(),
                        skill: skill_name.clone(),
                        sum: mix_sum,
                    });
                }
            }
            if (skill_sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(BlueprintError::SkillWeightSum {
                    domain: domain_name.clone(),
                    sum: skill_sum,
                });
            }
        }
        if (domain_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(BlueprintError::DomainWeightSum { sum: domain_sum });
        }

        Ok(Self { domains, length })
    }

    pub fn domains(&self) -> &HashMap<String, DomainSpec> {
        &self.domains
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

/// Integer counts per difficulty bucket; used for both targets and
/// served counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyCounts {
    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    fn bump(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    fn minus(&self, served: &DifficultyCounts) -> DifficultyCounts {
        DifficultyCounts {
            easy: self.easy.saturating_sub(served.easy),
            medium: self.medium.saturating_sub(served.medium),
            hard: self.hard.saturating_sub(served.hard),
        }
    }
}

/// Targets or remaining quota for one skill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillQuota {
    pub total: usize,
    pub by_difficulty: DifficultyCounts,
}

/// Targets or remaining quota for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainQuota {
    pub total: usize,
    pub by_skill: HashMap<String, SkillQuota>,
}

/// The full target (or remaining-quota) tree for a blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuotaTree {
    pub domains: HashMap<String, DomainQuota>,
}

impl QuotaTree {
    /// Sum of domain totals.
    pub fn total(&self) -> usize {
        self.domains.values().map(|d| d.total).sum()
    }

    pub fn domain(&self, name: &str) -> Option<&DomainQuota> {
        self.domains.get(name)
    }
}

/// Normalize non-negative weights to sum to 1; equal split when the sum
/// is zero.
fn safe_norm(weights: &mut HashMap<&str, f64>) {
    let sum: f64 = weights.values().map(|w| w.max(0.0)).sum();
    if sum <= 0.0 {
        let n = weights.len().max(1) as f64;
        for w in weights.values_mut() {
            *w = 1.0 / n;
        }
    } else {
        for w in weights.values_mut() {
            *w = w.max(0.0) / sum;
        }
    }
}

/// Compute per-domain/skill/difficulty integer targets by floor rounding
/// at each level independently. Rounding remainders are dropped by
/// design; targets are soft lower bounds.
pub fn compute_targets(spec: &BlueprintSpec) -> QuotaTree {
    let length = spec.length() as f64;
    let mut domains = HashMap::new();

    for (domain_name, domain) in spec.domains() {
        let domain_total = (length * domain.weight.max(0.0)).floor() as usize;

        let mut skill_weights: HashMap<&str, f64> = domain
            .skills
            .iter()
            .map(|(name, s)| (name.as_str(), s.weight))
            .collect();
        safe_norm(&mut skill_weights);

        let mut by_skill = HashMap::new();
        for (skill_name, skill) in &domain.skills {
            let skill_total =
                (domain_total as f64 * skill_weights[skill_name.as_str()]).floor() as usize;

            let mut mix: HashMap<&str, f64> = [
                ("easy", skill.difficulty.easy),
                ("medium", skill.difficulty.medium),
                ("hard", skill.difficulty.hard),
            ]
            .into_iter()
            .collect();
            safe_norm(&mut mix);

            let by_difficulty = DifficultyCounts {
                easy: (skill_total as f64 * mix["easy"]).floor() as usize,
                medium: (skill_total as f64 * mix["medium"]).floor() as usize,
                hard: (skill_total as f64 * mix["hard"]).floor() as usize,
            };

            by_skill.insert(
                skill_name.clone(),
                SkillQuota {
                    total: skill_total,
                    by_difficulty,
                },
            );
        }

        domains.insert(
            domain_name.clone(),
            DomainQuota {
                total: domain_total,
                by_skill,
            },
        );
    }

    QuotaTree { domains }
}

/// Served-count state for one skill.
#[derive(Debug, Clone, Default, Serialize)]
struct SkillCounter {
    total: usize,
    by_difficulty: DifficultyCounts,
}

/// Served-count state for one domain.
#[derive(Debug, Clone, Default, Serialize)]
struct DomainCounter {
    total: usize,
    by_skill: HashMap<String, SkillCounter>,
}

/// Runtime blueprint consumption state for one test session.
///
/// Owns a clone of the spec plus counters mirroring its hierarchy.
/// Counters move in one direction only; there is no way to return an
/// item to the pool.
#[derive(Debug, Clone, Serialize)]
pub struct BlueprintState {
    spec: BlueprintSpec,
    targets: QuotaTree,
    served: HashMap<String, DomainCounter>,
}

impl BlueprintState {
    pub fn new(spec: BlueprintSpec) -> Self {
        let targets = compute_targets(&spec);
        let served = spec
            .domains()
            .iter()
            .map(|(domain_name, domain)| {
                let by_skill = domain
                    .skills
                    .keys()
                    .map(|skill| (skill.clone(), SkillCounter::default()))
                    .collect();
                (
                    domain_name.clone(),
                    DomainCounter {
                        total: 0,
                        by_skill,
                    },
                )
            })
            .collect();
        Self {
            spec,
            targets,
            served,
        }
    }

    pub fn spec(&self) -> &BlueprintSpec {
        &self.spec
    }

    /// Integer targets computed once at construction.
    pub fn targets(&self) -> &QuotaTree {
        &self.targets
    }

    /// Total items served across all domains.
    pub fn total_served(&self) -> usize {
        self.served.values().map(|d| d.total).sum()
    }

    /// Remaining quota per domain/skill/difficulty, floored at zero.
    ///
    /// Pure query: calling it repeatedly without an intervening
    /// [`record_serve`](Self::record_serve) yields identical trees.
    pub fn remaining_quota(&self) -> QuotaTree {
        let mut domains = HashMap::new();
        for (domain_name, target) in &self.targets.domains {
            let Some(counter) = self.served.get(domain_name) else {
                continue;
            };
            let mut by_skill = HashMap::new();
            for (skill_name, skill_target) in &target.by_skill {
                let Some(skill_counter) = counter.by_skill.get(skill_name) else {
                    continue;
                };
                by_skill.insert(
                    skill_name.clone(),
                    SkillQuota {
                        total: skill_target.total.saturating_sub(skill_counter.total),
                        by_difficulty: skill_target
                            .by_difficulty
                            .minus(&skill_counter.by_difficulty),
                    },
                );
            }
            domains.insert(
                domain_name.clone(),
                DomainQuota {
                    total: target.total.saturating_sub(counter.total),
                    by_skill,
                },
            );
        }
        QuotaTree { domains }
    }

    /// True iff the domain, the skill, and the specific difficulty bucket
    /// all still show positive remaining quota. Unknown domains or skills
    /// are never eligible.
    pub fn is_eligible(&self, domain: &str, skill: &str, difficulty: Difficulty) -> bool {
        let remaining = self.remaining_quota();
        let Some(domain_quota) = remaining.domain(domain) else {
            return false;
        };
        if domain_quota.total == 0 {
            return false;
        }
        let Some(skill_quota) = domain_quota.by_skill.get(skill) else {
            return false;
        };
        if skill_quota.total == 0 {
            return false;
        }
        skill_quota.by_difficulty.get(difficulty) > 0
    }

    /// Record one served item against its taxonomy cell.
    ///
    /// Must be called at most once per served item. Domains or skills not
    /// declared in the spec still get counted (the selector's fallback
    /// path can serve off-blueprint items) so the stop rule keeps seeing
    /// the true total.
    pub fn record_serve(&mut self, domain: &str, skill: &str, difficulty: Difficulty) {
        let counter = self.served.entry(domain.to_string()).or_default();
        counter.total += 1;
        let skill_counter = counter.by_skill.entry(skill.to_string()).or_default();
        skill_counter.total += 1;
        skill_counter.by_difficulty.bump(difficulty);
    }

    /// True once the cumulative served count reaches the test length.
    pub fn should_stop(&self) -> bool {
        self.total_served() >= self.spec.length()
    }
}

/// The reference blueprint: two equally weighted domains, three skills
/// each, with illustrative difficulty mixes. Arbitrary specs satisfying
/// the weight-sum invariants are equally supported.
pub fn default_blueprint(length: usize) -> Result<BlueprintSpec, BlueprintError> {
    let math_skills: HashMap<String, SkillSpec> = [
        (
            "Algebra".to_string(),
            SkillSpec::new(0.35, DifficultyMix::new(0.35, 0.50, 0.15)),
        ),
        (
            "Advanced Math".to_string(),
            SkillSpec::new(0.35, DifficultyMix::new(0.25, 0.55, 0.20)),
        ),
        (
            "Problem Solving".to_string(),
            SkillSpec::new(0.30, DifficultyMix::new(0.40, 0.45, 0.15)),
        ),
    ]
    .into_iter()
    .collect();

    let rw_skills: HashMap<String, SkillSpec> = [
        (
            "Vocabulary".to_string(),
            SkillSpec::new(0.25, DifficultyMix::new(0.45, 0.45, 0.10)),
        ),
        (
            "Rhetoric".to_string(),
            SkillSpec::new(0.40, DifficultyMix::new(0.30, 0.50, 0.20)),
        ),
        (
            "Grammar".to_string(),
            SkillSpec::new(0.35, DifficultyMix::new(0.40, 0.45, 0.15)),
        ),
    ]
    .into_iter()
    .collect();

    let domains: HashMap<String, DomainSpec> = [
        ("Math".to_string(), DomainSpec::new(0.50, math_skills)),
        (
            "Reading & Writing".to_string(),
            DomainSpec::new(0.50, rw_skills),
        ),
    ]
    .into_iter()
    .collect();

    BlueprintSpec::new(domains, length)
}
