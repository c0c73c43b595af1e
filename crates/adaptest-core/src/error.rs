//! Configuration error types.
//!
//! Blueprint construction is the one place strict validation is
//! warranted: bad weights or a zero length are setup mistakes, not
//! runtime data noise. Per-item numeric edge cases never surface here;
//! they are absorbed through the zero-information convention.

use thiserror::Error;

/// Errors raised while constructing a [`BlueprintSpec`](crate::blueprint::BlueprintSpec).
#[derive(Debug, Error)]
pub enum BlueprintError {
    /// The test length must be at least 1.
    #[error("test length must be positive")]
    ZeroLength,

    /// A blueprint needs at least one domain.
    #[error("blueprint declares no domains")]
    NoDomains,

    /// Every domain needs at least one skill.
    #[error("domain '{domain}' declares no skills")]
    NoSkills { domain: String },

    /// A weight in the hierarchy is negative.
    #[error("negative weight {weight} in {scope}")]
    NegativeWeight { scope: String, weight: f64 },

    /// Domain weights must sum to 1 across the blueprint.
    #[error("domain weights sum to {sum:.4}, expected 1.0")]
    DomainWeightSum { sum: f64 },

    /// Skill weights must sum to 1 within each domain.
    #[error("skill weights in domain '{domain}' sum to {sum:.4}, expected 1.0")]
    SkillWeightSum { domain: String, sum: f64 },

    /// The difficulty mix must sum to 1 within each skill.
    #[error("difficulty mix for '{domain}/{skill}' sums to {sum:.4}, expected 1.0")]
    DifficultyMixSum {
        domain: String,
        skill: String,
        sum: f64,
    },
}
