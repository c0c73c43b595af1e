//! The `adaptest targets` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use adaptest_bank::load_blueprint;
use adaptest_core::blueprint::{compute_targets, default_blueprint};

pub fn execute(blueprint_path: Option<PathBuf>, length: usize) -> Result<()> {
    let spec = match blueprint_path {
        Some(path) => load_blueprint(&path)?,
        None => default_blueprint(length)?,
    };
    let targets = compute_targets(&spec);

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Skill", "Easy", "Medium", "Hard", "Total"]);

    let mut domain_names: Vec<&String> = targets.domains.keys().collect();
    domain_names.sort();
    for domain_name in domain_names {
        let domain = &targets.domains[domain_name];
        let mut skill_names: Vec<&String> = domain.by_skill.keys().collect();
        skill_names.sort();
        for skill_name in skill_names {
            let quota = &domain.by_skill[skill_name];
            table.add_row(vec![
                domain_name.clone(),
                skill_name.clone(),
                quota.by_difficulty.easy.to_string(),
                quota.by_difficulty.medium.to_string(),
                quota.by_difficulty.hard.to_string(),
                quota.total.to_string(),
            ]);
        }
        table.add_row(vec![
            domain_name.clone(),
            "(domain total)".to_string(),
            String::new(),
            String::new(),
            String::new(),
            domain.total.to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "Test length {}, allocated {} (floor rounding leaves the rest to selection).",
        spec.length(),
        targets.total()
    );

    Ok(())
}
