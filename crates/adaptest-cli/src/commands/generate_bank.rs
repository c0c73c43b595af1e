//! The `adaptest generate-bank` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

use adaptest_bank::{generate_bank, GeneratorConfig};

pub fn execute(output: PathBuf, items_per_skill: usize, seed: u64) -> Result<()> {
    anyhow::ensure!(items_per_skill >= 1, "items-per-skill must be at least 1");

    let (bank, params) = generate_bank(&GeneratorConfig {
        items_per_skill,
        seed,
    });

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;

    let items_path = output.join("items.json");
    let items_json = serde_json::to_string_pretty(bank.items())?;
    std::fs::write(&items_path, items_json)
        .with_context(|| format!("failed to write {}", items_path.display()))?;

    // Emit parameter records in bank order so output is reproducible.
    let records: Vec<serde_json::Value> = bank
        .iter()
        .filter_map(|item| {
            params.get(&item.id).map(|p| {
                json!({
                    "id": item.id,
                    "a": p.a,
                    "b": p.b,
                    "c": p.c,
                })
            })
        })
        .collect();
    let params_path = output.join("params.json");
    std::fs::write(&params_path, serde_json::to_string_pretty(&records)?)
        .with_context(|| format!("failed to write {}", params_path.display()))?;

    println!(
        "Wrote {} items to {} and parameters to {}",
        bank.len(),
        items_path.display(),
        params_path.display()
    );
    Ok(())
}
