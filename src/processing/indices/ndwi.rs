// src/processing/indices/ndwi.rs
use ndarray::{Array2, Array3, Zip};

use super::IndexCalculator;
use crate::config::NDWI_EPSILON;
use crate::error::{Error, Result};

/// Per-pixel normalized difference water index
pub type WaterIndexMap = Array2<f32>;

/// Normalized Difference Water Index (McFeeters): (GREEN - NIR) / (GREEN + NIR + eps)
pub fn derive_water_index(green: &Array2<f32>, nir: &Array2<f32>) -> Result<WaterIndexMap> {
    if green.is_empty() {
        return Err(Error::InvalidInput("green band has no pixels".to_string()));
    }
    if green.dim() != nir.dim() {
        return Err(Error::InvalidInput(format!(
            "green band is {:?} but NIR band is {:?}",
            green.dim(),
            nir.dim()
        )));
    }

    Ok(Zip::from(green)
        .and(nir)
        .par_map_collect(|&g, &n| (g - n) / (g + n + NDWI_EPSILON)))
}

/// NDWI calculator over a `(band, row, col)` stack
pub struct NDWI {
    green_index: usize,
    nir_index: usize,
    name: String,
}

impl NDWI {
    pub fn new(green_index: usize, nir_index: usize, name: Option<String>) -> Self {
        Self {
            green_index,
            nir_index,
            name: name.unwrap_or_else(|| "NDWI".to_string()),
        }
    }
}

impl Default for NDWI {
    /// Green in the first band, NIR in the second
    fn default() -> Self {
        Self::new(0, 1, None)
    }
}

impl IndexCalculator for NDWI {
    fn calculate(&self, bands: &Array3<f32>) -> Result<WaterIndexMap> {
        let band_count = bands.dim().0;
        if band_count < self.required_bands() {
            return Err(Error::InvalidInput(format!(
                "{} needs green and NIR bands, raster has {} band(s)",
                self.name, band_count
            )));
        }
        if self.green_index.max(self.nir_index) >= band_count {
            return Err(Error::InvalidInput(format!(
                "{} band indices ({}, {}) out of range for {} band(s)",
                self.name, self.green_index, self.nir_index, band_count
            )));
        }

        let green = bands.index_axis(ndarray::Axis(0), self.green_index).to_owned();
        let nir = bands.index_axis(ndarray::Axis(0), self.nir_index).to_owned();
        derive_water_index(&green, &nir)
    }

    fn required_bands(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn single_pixel_water() {
        let index = derive_water_index(&array![[1.0]], &array![[0.5]]).unwrap();
        assert_abs_diff_eq!(index[[0, 0]], 0.3333, epsilon = 1e-4);
        assert!(f64::from(index[[0, 0]]) > crate::config::WATER_THRESHOLD);
    }

    #[test]
    fn dark_pixels_do_not_divide_by_zero() {
        let index = derive_water_index(&array![[0.0, 0.2]], &array![[0.0, 0.6]]).unwrap();
        assert_eq!(index[[0, 0]], 0.0);
        assert_abs_diff_eq!(index[[0, 1]], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn mismatched_bands_are_rejected() {
        let err = derive_water_index(&Array2::zeros((2, 2)), &Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn stack_needs_two_bands() {
        let stack = Array3::<f32>::zeros((1, 4, 4));
        let err = NDWI::default().calculate(&stack).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn stack_uses_configured_band_order() {
        let mut stack = Array3::<f32>::zeros((3, 1, 1));
        stack[[0, 0, 0]] = 0.9; // red
        stack[[1, 0, 0]] = 0.6; // green
        stack[[2, 0, 0]] = 0.2; // nir
        let index = NDWI::new(1, 2, None).calculate(&stack).unwrap();
        assert_abs_diff_eq!(index[[0, 0]], 0.5, epsilon = 1e-4);
    }
}
