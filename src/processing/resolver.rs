// src/processing/resolver.rs
use ndarray::{Array2, Zip};

use super::estimator::{count_true, WaterMask};
use super::indices::{derive_water_index, WaterIndexMap};
use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::io::reader::{Grid, RasterValues};

/// Turns one time point's input into a water mask
pub trait MaskResolver: Send + Sync {
    fn resolve(&self, config: &EstimatorConfig) -> Result<WaterMask>;

    /// The NDWI map behind the mask, when the input carries one
    fn water_index(&self) -> Result<Option<WaterIndexMap>> {
        Ok(None)
    }

    fn name(&self) -> &str;
}

/// Strictly-greater-than threshold; NaN never counts as water
pub fn threshold_index<T>(index: &Array2<T>, threshold: T) -> WaterMask
where
    T: PartialOrd + Copy + Send + Sync,
{
    Zip::from(index).par_map_collect(|&v| v > threshold)
}

/// Thresholds a grid at its own precision
fn threshold_grid(index: &Grid, threshold: f64) -> WaterMask {
    match index {
        RasterValues::Single(values) => threshold_index(values, threshold as f32),
        RasterValues::Double(values) => threshold_index(values, threshold),
    }
}

/// A mask supplied as-is. Any non-zero, non-NaN value is water.
pub struct PrecomputedMask {
    values: Grid,
}

impl PrecomputedMask {
    pub fn new(values: impl Into<Grid>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl From<WaterMask> for PrecomputedMask {
    fn from(mask: WaterMask) -> Self {
        Self::new(mask.mapv(|w| if w { 1.0f32 } else { 0.0 }))
    }
}

impl MaskResolver for PrecomputedMask {
    fn resolve(&self, _config: &EstimatorConfig) -> Result<WaterMask> {
        Ok(match &self.values {
            RasterValues::Single(v) => Zip::from(v).par_map_collect(|&v| v != 0.0 && !v.is_nan()),
            RasterValues::Double(v) => Zip::from(v).par_map_collect(|&v| v != 0.0 && !v.is_nan()),
        })
    }

    fn name(&self) -> &str {
        "precomputed mask"
    }
}

/// A precomputed NDWI map, thresholded at `water_threshold` in the map's
/// own precision
pub struct ThresholdedIndex {
    index: Grid,
}

impl ThresholdedIndex {
    pub fn new(index: impl Into<Grid>) -> Self {
        Self {
            index: index.into(),
        }
    }
}

impl MaskResolver for ThresholdedIndex {
    fn resolve(&self, config: &EstimatorConfig) -> Result<WaterMask> {
        Ok(threshold_grid(&self.index, config.water_threshold))
    }

    fn water_index(&self) -> Result<Option<WaterIndexMap>> {
        Ok(Some(self.index.to_f32()))
    }

    fn name(&self) -> &str {
        "NDWI map"
    }
}

/// Raw green and NIR reflectance; NDWI is derived before thresholding
pub struct DerivedFromBands {
    green: Array2<f32>,
    nir: Array2<f32>,
}

impl DerivedFromBands {
    pub fn new(green: Array2<f32>, nir: Array2<f32>) -> Self {
        Self { green, nir }
    }
}

impl MaskResolver for DerivedFromBands {
    fn resolve(&self, config: &EstimatorConfig) -> Result<WaterMask> {
        let index = derive_water_index(&self.green, &self.nir)?;
        Ok(threshold_index(&index, config.water_threshold as f32))
    }

    fn water_index(&self) -> Result<Option<WaterIndexMap>> {
        derive_water_index(&self.green, &self.nir).map(Some)
    }

    fn name(&self) -> &str {
        "green/NIR bands"
    }
}

/// Fraction of pixels flagged as water, used for log output
pub(crate) fn water_fraction(mask: &WaterMask) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    count_true(mask) as f64 / mask.len() as f64
}
