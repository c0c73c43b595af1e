//! Synthetic bank generation for simulations and benchmarks.
//!
//! Items and parameters are drawn from a seeded RNG so the same seed
//! always yields the same bank. Difficulty tags are derived from the
//! sampled b parameter, keeping tags and parameters consistent.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use adaptest_core::model::{
    Choice, Difficulty, Item, ItemBank, IrtParameters, ItemId, ParameterTable,
};

/// The reference taxonomy, matching
/// [`default_blueprint`](adaptest_core::blueprint::default_blueprint).
const TAXONOMY: [(&str, &str); 6] = [
    ("Math", "Advanced Math"),
    ("Math", "Algebra"),
    ("Math", "Problem Solving"),
    ("Reading & Writing", "Grammar"),
    ("Reading & Writing", "Rhetoric"),
    ("Reading & Writing", "Vocabulary"),
];

/// Configuration for synthetic bank generation.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// Items generated per skill in the reference taxonomy.
    pub items_per_skill: usize,
    /// RNG seed; the same seed reproduces the same bank.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            items_per_skill: 20,
            seed: 7,
        }
    }
}

/// Generate a synthetic bank covering the reference taxonomy, with a
/// matching parameter table.
pub fn generate_bank(config: &GeneratorConfig) -> (ItemBank, ParameterTable) {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut items = Vec::new();
    let mut params = ParameterTable::new();

    for (domain, skill) in TAXONOMY {
        let prefix = skill
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(4)
            .collect::<String>()
            .to_lowercase();

        for n in 0..config.items_per_skill {
            let a = rng.gen_range(0.7..1.6);
            let b = rng.gen_range(-2.5..2.5);
            let c = rng.gen_range(0.1..0.3);

            let id = ItemId::new(format!("{prefix}-{n:03}"));
            params.insert(id.clone(), IrtParameters::new(a, b, c));

            items.push(Item {
                id,
                domain: domain.to_string(),
                skill: skill.to_string(),
                difficulty: Difficulty::from_b(b),
                stem: format!("Synthetic {skill} question {n}"),
                options: ["A", "B", "C", "D"]
                    .iter()
                    .map(|choice_id| Choice {
                        id: (*choice_id).to_string(),
                        text: format!("Option {choice_id}"),
                    })
                    .collect(),
                answer_key: "A".to_string(),
                stimulus: None,
            });
        }
    }

    info!(
        items = items.len(),
        skills = TAXONOMY.len(),
        seed = config.seed,
        "generated synthetic item bank"
    );
    (ItemBank::new(items), params)
}
