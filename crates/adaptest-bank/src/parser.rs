//! Item bank, parameter table, and blueprint file loading.
//!
//! Banks and parameter tables are JSON arrays; blueprints are TOML.
//! Structural problems in a blueprint fail fast; per-item data problems
//! surface as warnings from [`validate_bank`] instead.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use adaptest_core::blueprint::{BlueprintSpec, DifficultyMix, DomainSpec, SkillSpec};
use adaptest_core::model::{Item, ItemBank, IrtParameters, ItemId, ParameterTable};

/// Load an item bank from a JSON array of items.
pub fn load_items(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item file: {}", path.display()))?;
    let items: Vec<Item> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse items: {}", path.display()))?;
    Ok(ItemBank::new(items))
}

/// One record in a parameter file.
#[derive(Debug, Deserialize)]
struct ParameterRecord {
    id: ItemId,
    a: f64,
    b: f64,
    c: f64,
    /// Historical exposure fraction, carried into the tracker.
    #[serde(default)]
    exposure: f64,
}

/// A parameter table plus the historical exposure values stored with it.
///
/// The exposure pairs feed the simulation engine's shared tracker; items
/// loaded at or above the selector's limit start out filtered.
#[derive(Debug, Clone, Default)]
pub struct LoadedParameters {
    pub table: ParameterTable,
    pub initial_exposure: Vec<(ItemId, f64)>,
}

/// Load IRT parameters from a JSON array of `{id, a, b, c[, exposure]}`
/// records. Later records win on duplicate ids.
pub fn load_parameters(path: &Path) -> Result<LoadedParameters> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file: {}", path.display()))?;
    parse_parameters_str(&content, path)
}

fn parse_parameters_str(content: &str, source_path: &Path) -> Result<LoadedParameters> {
    let records: Vec<ParameterRecord> = serde_json::from_str(content)
        .with_context(|| format!("failed to parse parameters: {}", source_path.display()))?;

    let mut loaded = LoadedParameters::default();
    for record in records {
        loaded
            .table
            .insert(record.id.clone(), IrtParameters::new(record.a, record.b, record.c));
        if record.exposure != 0.0 {
            loaded.initial_exposure.push((record.id, record.exposure));
        }
    }
    Ok(loaded)
}

// Intermediate TOML structures for blueprint files.
#[derive(Debug, Deserialize)]
struct TomlBlueprintFile {
    length: usize,
    domains: HashMap<String, TomlDomain>,
}

#[derive(Debug, Deserialize)]
struct TomlDomain {
    weight: f64,
    skills: HashMap<String, TomlSkill>,
}

#[derive(Debug, Deserialize)]
struct TomlSkill {
    weight: f64,
    difficulty: TomlDifficultyMix,
}

#[derive(Debug, Deserialize)]
struct TomlDifficultyMix {
    easy: f64,
    medium: f64,
    hard: f64,
}

/// Load and validate a blueprint from a TOML file.
pub fn load_blueprint(path: &Path) -> Result<BlueprintSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint file: {}", path.display()))?;
    parse_blueprint_str(&content, path)
}

/// Parse a TOML string into a validated blueprint (useful for testing).
pub fn parse_blueprint_str(content: &str, source_path: &Path) -> Result<BlueprintSpec> {
    let parsed: TomlBlueprintFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let domains = parsed
        .domains
        .into_iter()
        .map(|(domain_name, domain)| {
            let skills = domain
                .skills
                .into_iter()
                .map(|(skill_name, skill)| {
                    (
                        skill_name,
                        SkillSpec::new(
                            skill.weight,
                            DifficultyMix::new(
                                skill.difficulty.easy,
                                skill.difficulty.medium,
                                skill.difficulty.hard,
                            ),
                        ),
                    )
                })
                .collect();
            (domain_name, DomainSpec::new(domain.weight, skills))
        })
        .collect();

    BlueprintSpec::new(domains, parsed.length)
        .with_context(|| format!("invalid blueprint: {}", source_path.display()))
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The offending item id, if applicable.
    pub item_id: Option<ItemId>,
    /// Warning message.
    pub message: String,
}

/// Check a bank against its parameter table for data integrity problems.
///
/// None of these are fatal: selection and scoring skip bad entries
/// silently, so the warnings exist to surface curation mistakes early.
pub fn validate_bank(bank: &ItemBank, params: &ParameterTable) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Duplicate item ids
    let mut seen = HashSet::new();
    for item in bank.iter() {
        if !seen.insert(&item.id) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item id: {}", item.id),
            });
        }
    }

    for item in bank.iter() {
        match params.get(&item.id) {
            None => warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "item has no IRT parameters and will never be selected".into(),
            }),
            Some(pars) if pars.is_degenerate() => warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!(
                    "degenerate IRT parameters (a={}, c={}) carry zero information",
                    pars.a, pars.c
                ),
            }),
            Some(_) => {}
        }

        if !item.options.is_empty()
            && !item.options.iter().any(|choice| choice.id == item.answer_key)
        {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("answer key '{}' matches no option", item.answer_key),
            });
        }

        if item.stem.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "stem is empty".into(),
            });
        }
    }

    // Parameters without a bank item
    for (id, _) in params.iter() {
        if bank.get(id).is_none() {
            warnings.push(ValidationWarning {
                item_id: Some(id.clone()),
                message: "parameter entry has no matching item in the bank".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::{Choice, Difficulty};
    use std::io::Write;
    use std::path::PathBuf;

    const VALID_BLUEPRINT: &str = r#"
length = 20

[domains."Math"]
weight = 0.5

[domains."Math".skills."Algebra"]
weight = 1.0
difficulty = { easy = 0.4, medium = 0.4, hard = 0.2 }

[domains."Reading & Writing"]
weight = 0.5

[domains."Reading & Writing".skills."Grammar"]
weight = 0.6
difficulty = { easy = 0.5, medium = 0.3, hard = 0.2 }

[domains."Reading & Writing".skills."Vocabulary"]
weight = 0.4
difficulty = { easy = 0.4, medium = 0.4, hard = 0.2 }
"#;

    #[test]
    fn parse_valid_blueprint() {
        let spec = parse_blueprint_str(VALID_BLUEPRINT, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(spec.length(), 20);
        assert_eq!(spec.domains().len(), 2);
        assert_eq!(
            spec.domains()["Reading & Writing"].skills.len(),
            2
        );
    }

    #[test]
    fn invalid_weight_sum_fails_fast() {
        let bad = VALID_BLUEPRINT.replace("weight = 0.5", "weight = 0.6");
        let err = parse_blueprint_str(&bad, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("invalid blueprint"));
    }

    #[test]
    fn malformed_toml_fails() {
        assert!(parse_blueprint_str("length = ", &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_items_and_parameters_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let items_path = dir.path().join("items.json");
        let params_path = dir.path().join("params.json");

        let mut f = std::fs::File::create(&items_path).unwrap();
        write!(
            f,
            r#"[{{"id":"m1","domain":"Math","skill":"Algebra","difficulty":"easy",
                 "stem":"2 + 2 = ?","options":[{{"id":"A","text":"4"}}],"answer_key":"A"}}]"#
        )
        .unwrap();
        let mut f = std::fs::File::create(&params_path).unwrap();
        write!(
            f,
            r#"[{{"id":"m1","a":1.2,"b":-0.5,"c":0.2,"exposure":0.15}}]"#
        )
        .unwrap();

        let bank = load_items(&items_path).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(
            bank.get(&ItemId::new("m1")).unwrap().difficulty,
            Difficulty::Easy
        );

        let loaded = load_parameters(&params_path).unwrap();
        assert_eq!(loaded.table.len(), 1);
        assert_eq!(loaded.table.get(&ItemId::new("m1")).unwrap().b, -0.5);
        assert_eq!(loaded.initial_exposure, vec![(ItemId::new("m1"), 0.15)]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_items(&PathBuf::from("does-not-exist.json")).is_err());
        assert!(load_blueprint(&PathBuf::from("does-not-exist.toml")).is_err());
    }

    fn item(id: &str) -> Item {
        Item {
            id: ItemId::new(id),
            domain: "Math".into(),
            skill: "Algebra".into(),
            difficulty: Difficulty::Medium,
            stem: "stem".into(),
            options: vec![
                Choice { id: "A".into(), text: "yes".into() },
                Choice { id: "B".into(), text: "no".into() },
            ],
            answer_key: "A".into(),
            stimulus: None,
        }
    }

    #[test]
    fn validation_flags_integrity_problems() {
        let mut orphan = item("m2");
        orphan.answer_key = "Z".into();
        let bank = ItemBank::new(vec![item("m1"), item("m1"), orphan]);

        let params: ParameterTable = [
            (ItemId::new("m1"), IrtParameters::new(1.0, 0.0, 0.2)),
            (ItemId::new("ghost"), IrtParameters::new(1.0, 0.0, 0.2)),
        ]
        .into_iter()
        .collect();

        let warnings = validate_bank(&bank, &params);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate item id")));
        assert!(messages.iter().any(|m| m.contains("no IRT parameters")));
        assert!(messages.iter().any(|m| m.contains("matches no option")));
        assert!(messages
            .iter()
            .any(|m| m.contains("no matching item in the bank")));
    }

    #[test]
    fn clean_bank_has_no_warnings() {
        let bank = ItemBank::new(vec![item("m1")]);
        let params: ParameterTable = [(ItemId::new("m1"), IrtParameters::new(1.0, 0.0, 0.2))]
            .into_iter()
            .collect();
        assert!(validate_bank(&bank, &params).is_empty());
    }
}
