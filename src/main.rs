// src/main.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

mod cli;

use crate::cli::{Cli, Commands};
use glof_watch::batch::process_batch;
use glof_watch::config::EstimatorConfig;
use glof_watch::io::{write_index, write_mask, IndexEncoding};
use glof_watch::processing::{run_analysis, Analysis, AnalysisRequest, WaterSource};
use glof_watch::report::Report;

fn load_config(cli: &Cli) -> Result<EstimatorConfig> {
    let mut config = match &cli.config {
        Some(path) => EstimatorConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => EstimatorConfig::default(),
    };
    cli.thresholds.overrides().apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn save_masks(dir: &Path, analysis: &Analysis) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_mask(&dir.join("mask_t1.npy"), &analysis.mask_t1, analysis.geo.as_ref())?;
    write_mask(&dir.join("mask_t2.npy"), &analysis.mask_t2, analysis.geo.as_ref())?;
    Ok(())
}

fn run_single(cli: &Cli, request: AnalysisRequest) -> Result<()> {
    let config = load_config(cli)?;
    let analysis = run_analysis(&request, &config)
        .with_context(|| format!("assessing {}", request.label()))?;

    if let Some(dir) = &cli.save_masks {
        save_masks(dir, &analysis)?;
    }

    let report = Report::new(analysis.lake.clone(), &analysis.result);
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Demo { data_dir } => {
            run_single(&cli, AnalysisRequest::demo(data_dir))?;
        }
        Commands::Assess { t1, t2, lake } => {
            let mut request = AnalysisRequest::new(t1.clone(), t2.clone());
            request.lake = lake.clone();
            run_single(&cli, request)?;
        }
        Commands::Ndwi { green, nir, output } => {
            let source = WaterSource::Bands {
                green: green.clone(),
                nir: nir.clone(),
            };
            let opened = source.open().with_context(|| format!("opening {source}"))?;
            let index = opened
                .resolver
                .water_index()?
                .context("green/NIR bands produced no index map")?;

            let encoding = IndexEncoding {
                use_fixed_point: !cli.float,
                scale_factor: cli.scale_factor,
            };
            write_index(output, &index, opened.geo.as_ref(), encoding)?;
            println!("Processing complete: {}", output.display());
        }
        Commands::Batch { batch_file } => {
            let summary = process_batch(batch_file, &cli.thresholds.overrides())?;
            if summary.failed > 0 {
                anyhow::bail!("{} lake(s) could not be assessed", summary.failed);
            }
        }
    }

    Ok(())
}
