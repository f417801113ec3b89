// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading inputs or assessing lake change
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed raster, wrong band count, non-2D grid or empty mask
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: T1 is {t1:?}, T2 is {t2:?}")]
    ShapeMismatch { t1: (usize, usize), t2: (usize, usize) },

    /// The T1 baseline holds no water pixels, so a relative change is undefined
    #[error("Change is undefined: T1 lake area is zero")]
    DivisionUndefined,

    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("NPY error in {}: {message}", path.display())]
    Npy { path: PathBuf, message: String },

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(e: ndarray::ShapeError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl Error {
    /// True for failures caused by the supplied data rather than the environment
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::ShapeMismatch { .. } | Error::Npy { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
