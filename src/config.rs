// src/config.rs
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// NDWI value above which a pixel counts as open water
pub const WATER_THRESHOLD: f64 = 0.10;

/// Ground area of one Sentinel-2 pixel (10 m x 10 m)
pub const PIXEL_AREA_M2: f64 = 100.0;

/// Change (%) at which risk becomes MEDIUM
pub const MEDIUM_RISK_PCT: f64 = 3.0;

/// Change (%) at which risk becomes HIGH
pub const HIGH_RISK_PCT: f64 = 8.0;

/// Added to the NDWI denominator so dark pixels never divide by zero
pub const NDWI_EPSILON: f32 = 1e-6;

pub const M2_PER_KM2: f64 = 1_000_000.0;

/// Tunable constants of the estimator. Missing fields fall back to the defaults above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub water_threshold: f64,
    pub pixel_area_m2: f64,
    pub medium_risk_pct: f64,
    pub high_risk_pct: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            water_threshold: WATER_THRESHOLD,
            pixel_area_m2: PIXEL_AREA_M2,
            medium_risk_pct: MEDIUM_RISK_PCT,
            high_risk_pct: HIGH_RISK_PCT,
        }
    }
}

impl EstimatorConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.water_threshold.is_finite() {
            return Err(Error::Config("water_threshold must be finite".to_string()));
        }
        if !(self.pixel_area_m2.is_finite() && self.pixel_area_m2 > 0.0) {
            return Err(Error::Config(format!(
                "pixel_area_m2 must be positive, got {}",
                self.pixel_area_m2
            )));
        }
        if !(self.medium_risk_pct.is_finite() && self.high_risk_pct.is_finite()) {
            return Err(Error::Config("risk cutoffs must be finite".to_string()));
        }
        if self.medium_risk_pct >= self.high_risk_pct {
            return Err(Error::Config(format!(
                "medium_risk_pct ({}) must be below high_risk_pct ({})",
                self.medium_risk_pct, self.high_risk_pct
            )));
        }
        Ok(())
    }
}

/// Command-line overrides layered on top of a loaded configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub water_threshold: Option<f64>,
    pub pixel_area_m2: Option<f64>,
    pub medium_risk_pct: Option<f64>,
    pub high_risk_pct: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut EstimatorConfig) {
        if let Some(v) = self.water_threshold {
            config.water_threshold = v;
        }
        if let Some(v) = self.pixel_area_m2 {
            config.pixel_area_m2 = v;
        }
        if let Some(v) = self.medium_risk_pct {
            config.medium_risk_pct = v;
        }
        if let Some(v) = self.high_risk_pct {
            config.high_risk_pct = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sentinel2_constants() {
        let config = EstimatorConfig::default();
        assert_eq!(config.water_threshold, 0.10);
        assert_eq!(config.pixel_area_m2, 100.0);
        assert_eq!(config.medium_risk_pct, 3.0);
        assert_eq!(config.high_risk_pct, 8.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EstimatorConfig = serde_json::from_str(r#"{"high_risk_pct": 10.0}"#).unwrap();
        assert_eq!(config.high_risk_pct, 10.0);
        assert_eq!(config.medium_risk_pct, MEDIUM_RISK_PCT);
        assert_eq!(config.pixel_area_m2, PIXEL_AREA_M2);
    }

    #[test]
    fn rejects_inverted_cutoffs() {
        let config = EstimatorConfig {
            medium_risk_pct: 8.0,
            high_risk_pct: 3.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_non_positive_pixel_area() {
        let config = EstimatorConfig {
            pixel_area_m2: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = EstimatorConfig::default();
        ConfigOverrides {
            water_threshold: Some(0.2),
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.water_threshold, 0.2);
        assert_eq!(config.high_risk_pct, HIGH_RISK_PCT);
    }
}
