// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigOverrides, EstimatorConfig};
use crate::processing::{AnalysisRequest, ParallelProcessor};
use crate::report::Report;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub lakes: Vec<AnalysisRequest>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct GlobalParams {
    #[serde(flatten)]
    pub estimator: EstimatorConfig,
    /// Worker threads; defaults to the number of CPUs
    #[serde(default)]
    pub workers: Option<usize>,
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading batch file {}", path.display()))?;
        let config: BatchConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing batch file {}", path.display()))?;
        if config.lakes.is_empty() {
            anyhow::bail!("batch file {} lists no lakes", path.display());
        }
        Ok(config)
    }
}

/// One line of the batch summary: a report, or the reason there is none
#[derive(Serialize, Debug)]
pub struct BatchEntry {
    pub lake: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BatchSummary {
    pub entries: Vec<BatchEntry>,
    pub failed: usize,
}

pub fn process_batch(config_path: &Path, overrides: &ConfigOverrides) -> Result<BatchSummary> {
    let config = BatchConfig::from_file(config_path)?;

    let mut estimator = config.global.estimator;
    overrides.apply(&mut estimator);
    estimator
        .validate()
        .with_context(|| format!("global parameters in {}", config_path.display()))?;

    let processor = ParallelProcessor::new(config.global.workers);
    let total = config.lakes.len();

    println!(
        "Starting batch assessment of {} lake(s) on {} worker(s)...",
        total,
        processor.workers()
    );

    let outcomes = processor.process_with(&config.lakes, &estimator, |i, done, outcome| {
        let label = config.lakes[i].label();
        match outcome {
            Ok(analysis) => println!(
                "[{}/{}] lake #{} {} -> {} ({:+.2}%)",
                done,
                total,
                i + 1,
                label,
                analysis.result.risk_level,
                analysis.result.change_pct
            ),
            Err(e) => println!(
                "[{}/{}] lake #{} {} -> failed: {}",
                done,
                total,
                i + 1,
                label,
                e
            ),
        }
    });

    let entries: Vec<BatchEntry> = config
        .lakes
        .iter()
        .zip(outcomes)
        .map(|(request, outcome)| match outcome {
            Ok(analysis) => BatchEntry {
                lake: request.label().to_string(),
                report: Some(Report::new(analysis.lake, &analysis.result)),
                error: None,
            },
            Err(e) => {
                log::warn!("{}: {}", request.label(), e);
                BatchEntry {
                    lake: request.label().to_string(),
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    let summary = BatchSummary { entries, failed };

    if let Some(output) = &config.output {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(output, json)
            .with_context(|| format!("writing batch summary {}", output.display()))?;
        log::info!("wrote batch summary {}", output.display());
    }

    println!(
        "Batch assessment complete: {} succeeded, {} failed",
        total - failed,
        failed
    );
    Ok(summary)
}
