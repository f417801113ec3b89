use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use glof_watch::config::ConfigOverrides;
use glof_watch::processing::WaterSource;

#[derive(Parser)]
#[command(name = "glof-watch")]
#[command(about = "Glacial lake area change and GLOF early warning")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Estimator configuration (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Write the resolved water masks (mask_t1.npy, mask_t2.npy) to this directory
    #[arg(long, global = true)]
    pub save_masks: Option<PathBuf>,

    /// Use float32 instead of int16 for NDWI GeoTIFF output
    #[arg(long, global = true)]
    pub float: bool,

    /// Scaling factor for fixed-point
    #[arg(long, default_value = "10000", global = true)]
    pub scale_factor: i32,
}

#[derive(Args)]
pub struct ThresholdArgs {
    /// NDWI above which a pixel is water (default 0.10)
    #[arg(long, global = true)]
    pub water_threshold: Option<f64>,

    /// Ground area of one pixel in m² (default 100)
    #[arg(long, global = true)]
    pub pixel_area: Option<f64>,

    /// Change (%) at which risk becomes MEDIUM (default 3)
    #[arg(long, global = true)]
    pub medium_pct: Option<f64>,

    /// Change (%) at which risk becomes HIGH (default 8)
    #[arg(long, global = true)]
    pub high_pct: Option<f64>,
}

impl ThresholdArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            water_threshold: self.water_threshold,
            pixel_area_m2: self.pixel_area,
            medium_risk_pct: self.medium_pct,
            high_risk_pct: self.high_pct,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assess the preloaded Chamoli demo lake
    Demo {
        /// Directory holding ndwi_t1.npy and lake_mask.npy
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Assess a lake from two time points
    Assess {
        /// T1 source: mask:PATH, index:PATH, stack:PATH or bands:GREEN,NIR
        #[arg(long)]
        t1: WaterSource,

        /// T2 source, same forms as --t1
        #[arg(long)]
        t2: WaterSource,

        /// Lake name for the report
        #[arg(long)]
        lake: Option<String>,
    },

    /// Normalized Difference Water Index: (GREEN-NIR)/(GREEN+NIR)
    Ndwi {
        /// Green band (A)
        #[arg(short = 'a', long)]
        green: PathBuf,

        /// NIR band (B)
        #[arg(short = 'b', long)]
        nir: PathBuf,

        /// Output file path (.npy or any GDAL raster format)
        #[arg(short, long, default_value = "ndwi.npy")]
        output: PathBuf,
    },

    /// Assess every lake listed in a JSON batch file
    Batch {
        /// Batch configuration file
        batch_file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sources_and_global_overrides() {
        let cli = Cli::try_parse_from([
            "glof-watch",
            "assess",
            "--t1",
            "index:t1.npy",
            "--t2",
            "bands:g.npy,n.npy",
            "--high-pct",
            "10",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.thresholds.overrides().high_risk_pct, Some(10.0));
        match cli.command {
            Commands::Assess { t1, t2, lake } => {
                assert_eq!(t1.to_string(), "index:t1.npy");
                assert_eq!(t2.paths().len(), 2);
                assert!(lake.is_none());
            }
            _ => panic!("expected assess"),
        }
    }

    #[test]
    fn rejects_unknown_source_kind() {
        let parsed = Cli::try_parse_from(["glof-watch", "assess", "--t1", "x:a", "--t2", "mask:b"]);
        assert!(parsed.is_err());
    }
}
