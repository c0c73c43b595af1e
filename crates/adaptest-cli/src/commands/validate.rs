//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_bank::{load_items, load_parameters, validate_bank};

pub fn execute(bank_path: PathBuf, params_path: PathBuf) -> Result<()> {
    let bank = load_items(&bank_path)?;
    let params = load_parameters(&params_path)?;

    println!(
        "Bank: {} items, {} parameter entries",
        bank.len(),
        params.table.len()
    );

    let warnings = validate_bank(&bank, &params.table);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Bank is consistent.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
