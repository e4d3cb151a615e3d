//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Three surfaces for a run result:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: one prediction row per entity for external analysis tools
//! - **Markdown**: human-readable metrics report
//!
//! Persisted manifests carry a `schema_version` field; unknown future
//! versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::runner::{FutureForecast, PredictionRecord, RunResult, Variant, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunResult` to pretty JSON.
pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

/// Deserialize a `RunResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunResult> {
    let result: RunResult =
        serde_json::from_str(json).context("failed to deserialize RunResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export predictions as CSV: one row per entity.
///
/// Columns: comune, predicted, actual (actual left empty for future-year
/// forecasts).
pub fn export_predictions_csv(predictions: &[PredictionRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["comune", "predicted", "actual"])?;
    for p in predictions {
        wtr.write_record([
            p.entity_id.as_str(),
            &format!("{:.4}", p.predicted),
            &p.actual.map(|a| format!("{a:.4}")).unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one evaluation pass.
pub fn generate_report(result: &RunResult) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Forecast Evaluation Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    let variant = match result.variant {
        Variant::Univariate => "univariate",
        Variant::Tabular => "tabular",
    };
    md.push_str(&format!("| Variant | {variant} |\n"));
    md.push_str(&format!(
        "| Train years | through {} |\n",
        result.train_cutoff_year
    ));
    md.push_str(&format!("| Test year | {} |\n", result.test_year));
    md.push_str(&format!("| Entities | {} |\n", result.entity_count));
    md.push_str(&format!("| Predicted | {} |\n", result.predictions.len()));
    md.push_str(&format!("| Skipped | {} |\n", result.skipped.len()));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if let Some(ref params) = result.best_params {
        md.push_str(&format!(
            "| Best Params | trees={}, lr={}, depth={}, subsample={} |\n",
            params.n_trees, params.learning_rate, params.max_depth, params.subsample
        ));
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Metrics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Mean Squared Error | {:.4} |\n", m.mse));
    md.push_str(&format!("| Root Mean Squared Error | {:.4} |\n", m.rmse));
    md.push_str(&format!("| R2 Score | {:.4} |\n", m.r2));
    md.push_str(&format!("| Explained Variance | {:.4} |\n", m.explained_variance));
    md.push_str(&format!("| Mean Absolute Error | {:.4} |\n", m.mae));
    md.push_str(&format!("| Median Absolute Error | {:.4} |\n", m.median_ae));
    md.push_str(&format!("| Fit Time (s) | {:.3} |\n", result.fit_seconds));
    md.push('\n');

    if !result.skipped.is_empty() {
        md.push_str("## Skipped Entities\n\n");
        for s in &result.skipped {
            md.push_str(&format!("- {}: {:?}\n", s.entity_id, s.reason));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one evaluation pass.
///
/// Creates a directory named `{variant}_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json` — the full `RunResult`
/// - `predictions.csv` — entity/predicted/actual rows
/// - `report.md` — metrics report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &RunResult, output_dir: &Path) -> Result<PathBuf> {
    let variant = match result.variant {
        Variant::Univariate => "univariate",
        Variant::Tabular => "tabular",
    };
    let dirname = format!("{variant}_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let csv = export_predictions_csv(&result.predictions)?;
    std::fs::write(run_dir.join("predictions.csv"), &csv)?;

    let report = generate_report(result);
    std::fs::write(run_dir.join("report.md"), &report)?;

    Ok(run_dir)
}

/// Load a `RunResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<RunResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

/// Write a future-year forecast as a predictions CSV.
pub fn save_forecast_csv(forecast: &FutureForecast, path: &Path) -> Result<()> {
    let csv = export_predictions_csv(&forecast.predictions)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
