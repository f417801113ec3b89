pub mod ndwi;

use ndarray::Array3;

use crate::error::Result;

// Re-export indices
pub use ndwi::{derive_water_index, WaterIndexMap, NDWI};

/// Trait for spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from a `(band, row, col)` stack
    fn calculate(&self, bands: &Array3<f32>) -> Result<WaterIndexMap>;

    /// Return the number of required input bands
    fn required_bands(&self) -> usize;

    /// Return the name of the index
    fn name(&self) -> &str;
}
