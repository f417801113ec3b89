// src/processing/source.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::indices::{IndexCalculator, NDWI};
use super::resolver::{DerivedFromBands, MaskResolver, PrecomputedMask, ThresholdedIndex};
use crate::error::{Error, Result};
use crate::io::reader::{read_bands_parallel, read_raster, GeoInfo};

/// Where the water signal for one time point comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WaterSource {
    /// Precomputed water mask (bool or 0/1 grid)
    Mask { path: PathBuf },
    /// Precomputed NDWI map
    Index { path: PathBuf },
    /// Multi-band raster with green and NIR as the first two bands
    Stack { path: PathBuf },
    /// Separate single-band green and NIR rasters
    Bands { green: PathBuf, nir: PathBuf },
}

/// A loaded source, ready to produce a water mask
pub struct OpenedSource {
    pub resolver: Box<dyn MaskResolver>,
    pub geo: Option<GeoInfo>,
    pub shape: (usize, usize),
}

impl WaterSource {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            WaterSource::Mask { path } | WaterSource::Index { path } | WaterSource::Stack { path } => {
                vec![path.as_path()]
            }
            WaterSource::Bands { green, nir } => vec![green.as_path(), nir.as_path()],
        }
    }

    pub fn open(&self) -> Result<OpenedSource> {
        match self {
            WaterSource::Mask { path } => {
                let raster = read_raster(path)?;
                let (geo, shape) = (raster.geo.clone(), raster.shape());
                let values = raster.into_single_band()?;
                Ok(OpenedSource {
                    resolver: Box::new(PrecomputedMask::new(values)),
                    geo,
                    shape,
                })
            }
            WaterSource::Index { path } => {
                let raster = read_raster(path)?;
                let (geo, shape) = (raster.geo.clone(), raster.shape());
                let index = raster.into_single_band()?;
                Ok(OpenedSource {
                    resolver: Box::new(ThresholdedIndex::new(index)),
                    geo,
                    shape,
                })
            }
            WaterSource::Stack { path } => {
                let raster = read_raster(path)?;
                let (geo, shape, band_count) =
                    (raster.geo.clone(), raster.shape(), raster.band_count());
                let ndwi = NDWI::default();
                let index = ndwi.calculate(&raster.bands.into_f32()).map_err(|e| match e {
                    Error::InvalidInput(msg) => {
                        Error::InvalidInput(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                })?;
                if band_count > ndwi.required_bands() {
                    log::debug!(
                        "{}: using bands 1-2 of {} as green/NIR",
                        path.display(),
                        band_count
                    );
                }
                Ok(OpenedSource {
                    resolver: Box::new(ThresholdedIndex::new(index)),
                    geo,
                    shape,
                })
            }
            WaterSource::Bands { green, nir } => {
                let mut rasters = read_bands_parallel(&[green.as_path(), nir.as_path()])?;
                let nir_raster = rasters.pop().ok_or_else(|| Error::MissingInput(nir.clone()))?;
                let green_raster =
                    rasters.pop().ok_or_else(|| Error::MissingInput(green.clone()))?;

                if green_raster.shape() != nir_raster.shape() {
                    return Err(Error::InvalidInput(format!(
                        "{} is {:?} but {} is {:?}",
                        green.display(),
                        green_raster.shape(),
                        nir.display(),
                        nir_raster.shape()
                    )));
                }
                let (geo, shape) = (green_raster.geo.clone(), green_raster.shape());
                Ok(OpenedSource {
                    resolver: Box::new(DerivedFromBands::new(
                        green_raster.into_single_band()?.into_f32(),
                        nir_raster.into_single_band()?.into_f32(),
                    )),
                    geo,
                    shape,
                })
            }
        }
    }
}

impl fmt::Display for WaterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaterSource::Mask { path } => write!(f, "mask:{}", path.display()),
            WaterSource::Index { path } => write!(f, "index:{}", path.display()),
            WaterSource::Stack { path } => write!(f, "stack:{}", path.display()),
            WaterSource::Bands { green, nir } => {
                write!(f, "bands:{},{}", green.display(), nir.display())
            }
        }
    }
}

/// Parses `KIND:PATH`, where KIND is mask, index or stack, or `bands:GREEN,NIR`
impl FromStr for WaterSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, rest) = s.split_once(':').ok_or_else(|| {
            Error::InvalidInput(format!(
                "'{s}' is not a source; expected mask:PATH, index:PATH, stack:PATH or bands:GREEN,NIR"
            ))
        })?;
        if rest.is_empty() {
            return Err(Error::InvalidInput(format!("'{s}' has no path")));
        }

        match kind.to_lowercase().as_str() {
            "mask" => Ok(WaterSource::Mask { path: rest.into() }),
            "index" | "ndwi" => Ok(WaterSource::Index { path: rest.into() }),
            "stack" => Ok(WaterSource::Stack { path: rest.into() }),
            "bands" => {
                let (green, nir) = rest.split_once(',').ok_or_else(|| {
                    Error::InvalidInput(format!("'{s}' needs two paths: bands:GREEN,NIR"))
                })?;
                if green.is_empty() || nir.is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "'{s}' needs two paths: bands:GREEN,NIR"
                    )));
                }
                Ok(WaterSource::Bands {
                    green: green.into(),
                    nir: nir.into(),
                })
            }
            other => Err(Error::InvalidInput(format!("unknown source kind '{other}'"))),
        }
    }
}
