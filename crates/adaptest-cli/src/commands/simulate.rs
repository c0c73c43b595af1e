//! The `adaptest simulate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::Table;

use adaptest_bank::{generate_bank, load_blueprint, load_items, load_parameters, GeneratorConfig};
use adaptest_core::blueprint::default_blueprint;
use adaptest_core::session::SessionConfig;
use adaptest_services::{MockExplanationService, MockReportService};
use adaptest_sim::{SimProgress, SimulationConfig, SimulationEngine, SimulationReport};

/// Console progress reporter.
struct ConsoleReporter;

impl SimProgress for ConsoleReporter {
    fn session_finished(&self, completed: usize, total: usize) {
        eprintln!("  Session {completed}/{total} finished");
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    bank_path: Option<PathBuf>,
    params_path: Option<PathBuf>,
    blueprint_path: Option<PathBuf>,
    blueprint_length: Option<usize>,
    sessions: usize,
    parallelism: usize,
    seed: u64,
    max_items: Option<usize>,
    se_threshold: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(sessions >= 1, "sessions must be at least 1");
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(se_threshold > 0.0, "se-threshold must be positive");

    let (bank, params, initial_exposure) = match (&bank_path, &params_path) {
        (Some(bank_path), Some(params_path)) => {
            let bank = load_items(bank_path)?;
            let loaded = load_parameters(params_path)?;
            (bank, loaded.table, loaded.initial_exposure)
        }
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("--bank and --params must be given together")
        }
        (None, None) => {
            eprintln!("No bank given; using a synthetic bank.");
            let (bank, params) = generate_bank(&GeneratorConfig {
                items_per_skill: 40,
                seed,
            });
            (bank, params, Vec::new())
        }
    };

    let blueprint = match (&blueprint_path, blueprint_length) {
        (Some(path), _) => Some(load_blueprint(path)?),
        (None, Some(length)) => Some(default_blueprint(length)?),
        (None, None) => None,
    };

    let config = SimulationConfig {
        sessions,
        parallelism,
        seed,
        session: SessionConfig {
            max_items,
            se_threshold: Some(se_threshold),
            ..SessionConfig::default()
        },
        blueprint,
        initial_exposure,
        ..SimulationConfig::default()
    };

    let engine = SimulationEngine::new(
        config,
        Arc::new(MockExplanationService::default()),
        Arc::new(MockReportService::new()),
    );
    let report = engine
        .run(Arc::new(bank), Arc::new(params), Arc::new(ConsoleReporter))
        .await?;

    print_aggregate(&report);

    if let Some(path) = output {
        report.save_json(&path)?;
        println!("\nFull report written to {}", path.display());
    }

    Ok(())
}

fn print_aggregate(report: &SimulationReport) {
    let a = &report.aggregate;

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Sessions".to_string(), a.sessions.to_string()]);
    table.add_row(vec!["Mean bias".to_string(), format!("{:+.3}", a.mean_bias)]);
    table.add_row(vec!["RMSE".to_string(), format!("{:.3}", a.rmse)]);
    table.add_row(vec!["Mean SE".to_string(), format!("{:.3}", a.mean_se)]);
    table.add_row(vec![
        "Mean items served".to_string(),
        format!("{:.1}", a.mean_items_served),
    ]);
    table.add_row(vec![
        "Items exposed".to_string(),
        a.items_exposed.to_string(),
    ]);
    table.add_row(vec![
        "Max exposure".to_string(),
        format!("{:.2}", a.max_exposure),
    ]);
    table.add_row(vec![
        "Duration (ms)".to_string(),
        report.duration_ms.to_string(),
    ]);
    println!("{table}");

    if !a.serves_by_skill.is_empty() {
        let mut skills = Table::new();
        skills.set_header(vec!["Skill", "Serves"]);
        for (skill, serves) in &a.serves_by_skill {
            skills.add_row(vec![skill.clone(), serves.to_string()]);
        }
        println!("{skills}");
    }
}
