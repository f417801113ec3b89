// src/processing/analysis.rs
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::estimator::{AssessmentResult, LakeChangeEstimator, WaterMask};
use super::resolver::water_fraction;
use super::source::{OpenedSource, WaterSource};
use crate::config::EstimatorConfig;
use crate::error::{Error, Result};
use crate::io::reader::GeoInfo;

pub const DEMO_LAKE: &str = "Chamoli";
pub const DEMO_INDEX_T1: &str = "ndwi_t1.npy";
pub const DEMO_MASK_T2: &str = "lake_mask.npy";

/// Everything one assessment needs, passed explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, rename = "name")]
    pub lake: Option<String>,
    pub t1: WaterSource,
    pub t2: WaterSource,
}

impl AnalysisRequest {
    pub fn new(t1: WaterSource, t2: WaterSource) -> Self {
        Self { lake: None, t1, t2 }
    }

    pub fn with_lake(mut self, lake: impl Into<String>) -> Self {
        self.lake = Some(lake.into());
        self
    }

    /// The preloaded Chamoli scene: NDWI map for T1, detected lake mask for T2
    pub fn demo(data_dir: &Path) -> Self {
        Self::new(
            WaterSource::Index {
                path: data_dir.join(DEMO_INDEX_T1),
            },
            WaterSource::Mask {
                path: data_dir.join(DEMO_MASK_T2),
            },
        )
        .with_lake(DEMO_LAKE)
    }

    pub fn label(&self) -> &str {
        self.lake.as_deref().unwrap_or("lake")
    }
}

/// A completed assessment plus the masks it was computed from
#[derive(Debug, Clone)]
pub struct Analysis {
    pub lake: Option<String>,
    pub result: AssessmentResult,
    pub mask_t1: WaterMask,
    pub mask_t2: WaterMask,
    pub geo: Option<GeoInfo>,
}

fn check_ground_sample_distance(
    t1: &OpenedSource,
    t2: &OpenedSource,
    config: &EstimatorConfig,
) -> Result<()> {
    if let (Some(geo_t1), Some(geo_t2)) = (&t1.geo, &t2.geo) {
        let (a, b) = (geo_t1.pixel_size(), geo_t2.pixel_size());
        let close = |x: f64, y: f64| (x - y).abs() <= 1e-6 * x.abs().max(y.abs());
        if !(close(a.0, b.0) && close(a.1, b.1)) {
            return Err(Error::InvalidInput(format!(
                "T1 pixels are {}x{} but T2 pixels are {}x{}; areas are not comparable",
                a.0, a.1, b.0, b.1
            )));
        }
    }

    for geo in [&t1.geo, &t2.geo].into_iter().flatten() {
        let native = geo.pixel_area();
        if (native - config.pixel_area_m2).abs() > 1e-6 * config.pixel_area_m2 {
            log::warn!(
                "raster pixel area is {} map units² but areas use {} m² per pixel",
                native,
                config.pixel_area_m2
            );
        }
    }
    Ok(())
}

/// Load, resolve and assess both time points of a request
pub fn run_analysis(request: &AnalysisRequest, config: &EstimatorConfig) -> Result<Analysis> {
    config.validate()?;

    log::info!("assessing {}: T1 {} / T2 {}", request.label(), request.t1, request.t2);
    let t1 = request.t1.open()?;
    let t2 = request.t2.open()?;
    check_ground_sample_distance(&t1, &t2, config)?;

    let mask_t1 = t1.resolver.resolve(config)?;
    let mask_t2 = t2.resolver.resolve(config)?;
    log::debug!(
        "T1 {} is {:.1}% water, T2 {} is {:.1}% water",
        t1.resolver.name(),
        water_fraction(&mask_t1) * 100.0,
        t2.resolver.name(),
        water_fraction(&mask_t2) * 100.0
    );

    let result = LakeChangeEstimator::new(*config).assess(&mask_t1, &mask_t2)?;
    log::info!(
        "{}: {:.3} -> {:.3} km² ({:+.2}%), risk {}",
        request.label(),
        result.area_t1_km2,
        result.area_t2_km2,
        result.change_pct,
        result.risk_level
    );

    Ok(Analysis {
        lake: request.lake.clone(),
        result,
        mask_t1,
        mask_t2,
        geo: t1.geo.or(t2.geo),
    })
}
