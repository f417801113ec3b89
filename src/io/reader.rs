// src/io/reader.rs
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use ndarray::{Array, Array3, ArrayD, Axis, Dimension, Ix2, Ix3, IxDyn};
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Georeferencing carried over from a GDAL-readable input
#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    /// Pixel width and height in map units
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.geo_transform[1].abs(), self.geo_transform[5].abs())
    }

    pub fn pixel_area(&self) -> f64 {
        let (w, h) = self.pixel_size();
        w * h
    }
}

/// Cell values kept at the precision they were stored with.
///
/// Float64 and integer inputs stay `f64` so thresholds compare exactly as
/// they would against the stored data; float32 and boolean inputs stay `f32`.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterValues<D: Dimension> {
    Single(Array<f32, D>),
    Double(Array<f64, D>),
}

/// `(band, row, col)` stack
pub type BandStack = RasterValues<Ix3>;

/// `(row, col)` grid
pub type Grid = RasterValues<Ix2>;

impl<D: Dimension> RasterValues<D> {
    pub fn dim(&self) -> D::Pattern {
        match self {
            RasterValues::Single(a) => a.dim(),
            RasterValues::Double(a) => a.dim(),
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, RasterValues::Double(_))
    }

    pub fn to_f32(&self) -> Array<f32, D> {
        match self {
            RasterValues::Single(a) => a.clone(),
            RasterValues::Double(a) => a.mapv(|v| v as f32),
        }
    }

    pub fn into_f32(self) -> Array<f32, D> {
        match self {
            RasterValues::Single(a) => a,
            RasterValues::Double(a) => a.mapv(|v| v as f32),
        }
    }
}

impl<D: Dimension> From<Array<f32, D>> for RasterValues<D> {
    fn from(values: Array<f32, D>) -> Self {
        RasterValues::Single(values)
    }
}

impl<D: Dimension> From<Array<f64, D>> for RasterValues<D> {
    fn from(values: Array<f64, D>) -> Self {
        RasterValues::Double(values)
    }
}

/// A raster held in memory as a `(band, row, col)` stack
#[derive(Debug, Clone)]
pub struct LoadedRaster {
    pub path: PathBuf,
    pub bands: BandStack,
    pub geo: Option<GeoInfo>,
}

impl LoadedRaster {
    pub fn band_count(&self) -> usize {
        self.bands.dim().0
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.bands.dim();
        (rows, cols)
    }

    /// The only band of a mask or index raster
    pub fn into_single_band(self) -> Result<Grid> {
        if self.band_count() != 1 {
            return Err(Error::InvalidInput(format!(
                "{}: expected a single-band grid, found {} bands",
                self.path.display(),
                self.band_count()
            )));
        }
        Ok(match self.bands {
            RasterValues::Single(a) => RasterValues::Single(a.index_axis_move(Axis(0), 0)),
            RasterValues::Double(a) => RasterValues::Double(a.index_axis_move(Axis(0), 0)),
        })
    }
}

/// Reads `.npy` arrays directly; every other extension goes through GDAL
pub fn read_raster(path: &Path) -> Result<LoadedRaster> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let is_npy = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"));

    let raster = if is_npy {
        read_npy_raster(path)?
    } else {
        read_gdal_raster(path)?
    };

    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidInput(format!(
            "{}: raster has no pixels ({}x{})",
            path.display(),
            cols,
            rows
        )));
    }

    log::debug!(
        "read {} ({} band(s), {}x{})",
        path.display(),
        raster.band_count(),
        cols,
        rows
    );
    Ok(raster)
}

/// Read several rasters concurrently, keeping input order
pub fn read_bands_parallel(paths: &[&Path]) -> Result<Vec<LoadedRaster>> {
    paths.par_iter().map(|path| read_raster(path)).collect()
}

fn npy_error(path: &Path, e: ReadNpyError) -> Error {
    Error::Npy {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Decode any numeric or boolean `.npy` array. float32 and bool stay single
/// precision; float64 and integers widen to `f64`.
pub fn read_npy_array(path: &Path) -> Result<RasterValues<IxDyn>> {
    let bytes = fs::read(path)?;

    macro_rules! try_dtype {
        ($t:ty, $wrap:ident, $out:ty) => {
            match ArrayD::<$t>::read_npy(Cursor::new(&bytes)) {
                Ok(array) => return Ok(RasterValues::$wrap(array.mapv(|v| v as $out))),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(npy_error(path, e)),
            }
        };
        ($t:ty) => {
            try_dtype!($t, Double, f64)
        };
    }

    try_dtype!(f32, Single, f32);
    try_dtype!(f64);
    match ArrayD::<bool>::read_npy(Cursor::new(&bytes)) {
        Ok(array) => {
            return Ok(RasterValues::Single(
                array.mapv(|v| if v { 1.0 } else { 0.0 }),
            ))
        }
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        Err(e) => return Err(npy_error(path, e)),
    }
    try_dtype!(u8);
    try_dtype!(i8);
    try_dtype!(u16);
    try_dtype!(i16);
    try_dtype!(u32);
    try_dtype!(i32);
    try_dtype!(u64);
    try_dtype!(i64);

    Err(Error::InvalidInput(format!(
        "{}: unsupported NPY dtype (expected bool, integer or float)",
        path.display()
    )))
}

/// 2D arrays become one band; 3D arrays are image-like `(row, col, band)`
fn to_band_stack<T: Clone>(path: &Path, array: ArrayD<T>) -> Result<Array3<T>> {
    match array.ndim() {
        2 => Ok(array.into_dimensionality::<Ix2>()?.insert_axis(Axis(0))),
        3 => Ok(array
            .into_dimensionality::<Ix3>()?
            .permuted_axes([2, 0, 1])
            .as_standard_layout()
            .into_owned()),
        n => Err(Error::InvalidInput(format!(
            "{}: expected a 2D grid or 3D band stack, got a {}D array",
            path.display(),
            n
        ))),
    }
}

fn read_npy_raster(path: &Path) -> Result<LoadedRaster> {
    let bands = match read_npy_array(path)? {
        RasterValues::Single(array) => RasterValues::Single(to_band_stack(path, array)?),
        RasterValues::Double(array) => RasterValues::Double(to_band_stack(path, array)?),
    };

    Ok(LoadedRaster {
        path: path.to_path_buf(),
        bands,
        geo: None,
    })
}

#[cfg(feature = "gdal")]
fn read_gdal_bands<T>(dataset: &gdal::Dataset, band_count: usize, nan: T) -> Result<Array3<T>>
where
    T: gdal::raster::GdalType + Copy + Into<f64>,
{
    let (width, height) = dataset.raster_size();
    let mut bands = Array3::from_elem((band_count, height, width), nan);
    for i in 0..band_count {
        let band = dataset.rasterband((i + 1) as _)?;
        let buffer = band.read_as::<T>((0, 0), (width, height), (width, height), None)?;
        let mut grid = ndarray::Array2::from_shape_vec((height, width), buffer.data().to_vec())?;

        // NoData pixels must never count as water
        if let Some(nodata) = band.no_data_value() {
            grid.mapv_inplace(|v| if Into::<f64>::into(v) == nodata { nan } else { v });
        }
        bands.index_axis_mut(Axis(0), i).assign(&grid);
    }
    Ok(bands)
}

#[cfg(feature = "gdal")]
fn read_gdal_raster(path: &Path) -> Result<LoadedRaster> {
    use gdal::raster::GdalDataType;
    use gdal::Dataset;

    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let band_count = dataset.raster_count() as usize;
    if band_count == 0 {
        return Err(Error::InvalidInput(format!(
            "{}: raster has no bands",
            path.display()
        )));
    }

    let double = matches!(
        dataset.rasterband(1)?.band_type(),
        GdalDataType::Float64 | GdalDataType::Int32 | GdalDataType::UInt32
    );
    let bands = if double {
        RasterValues::Double(read_gdal_bands(&dataset, band_count, f64::NAN)?)
    } else {
        RasterValues::Single(read_gdal_bands(&dataset, band_count, f32::NAN)?)
    };

    let geo = match dataset.geo_transform() {
        Ok(geo_transform) => Some(GeoInfo {
            projection: dataset.projection(),
            geo_transform,
            width,
            height,
        }),
        Err(_) => {
            log::debug!("{} carries no geotransform", path.display());
            None
        }
    };

    Ok(LoadedRaster {
        path: path.to_path_buf(),
        bands,
        geo,
    })
}

#[cfg(not(feature = "gdal"))]
fn read_gdal_raster(path: &Path) -> Result<LoadedRaster> {
    Err(Error::InvalidInput(format!(
        "{}: only .npy inputs are supported without the `gdal` feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array, ArrayD, IxDyn};
    use ndarray_npy::write_npy;
    use tempfile::tempdir;

    #[test]
    fn reads_float64_grid_as_single_band() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ndwi.npy");
        write_npy(&path, &array![[0.5f64, -0.2], [0.0, 0.100000003]]).unwrap();

        let raster = read_raster(&path).unwrap();
        assert_eq!(raster.band_count(), 1);
        assert_eq!(raster.shape(), (2, 2));
        assert!(raster.geo.is_none());
        match raster.into_single_band().unwrap() {
            RasterValues::Double(band) => assert_eq!(band[[1, 1]], 0.100000003f64),
            other => panic!("float64 grid narrowed to {:?}", other),
        }
    }

    #[test]
    fn float32_grid_stays_single_precision() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ndwi.npy");
        write_npy(&path, &array![[0.25f32, -0.5]]).unwrap();

        let band = read_raster(&path).unwrap().into_single_band().unwrap();
        assert!(!band.is_double());
        assert_eq!(band.into_f32(), array![[0.25f32, -0.5]]);
    }

    #[test]
    fn reads_bool_mask() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask.npy");
        write_npy(&path, &array![[true, false, true]]).unwrap();

        let band = read_raster(&path).unwrap().into_single_band().unwrap();
        assert_eq!(band, RasterValues::Single(array![[1.0f32, 0.0, 1.0]]));
    }

    #[test]
    fn reads_channel_last_stack() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.npy");
        // 1 row, 2 cols, 3 channels
        let image = Array::from_shape_vec((1, 2, 3), vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        write_npy(&path, &image).unwrap();

        let raster = read_raster(&path).unwrap();
        assert_eq!(raster.band_count(), 3);
        assert_eq!(raster.shape(), (1, 2));
        let bands = raster.bands.to_f32();
        assert_eq!(bands[[0, 0, 1]], 4.0);
        assert_eq!(bands[[1, 0, 0]], 2.0);
        assert!(raster.into_single_band().is_err());
    }

    #[test]
    fn rejects_one_and_four_dimensional_arrays() {
        let dir = tempdir().unwrap();
        let flat = dir.path().join("flat.npy");
        write_npy(&flat, &array![1.0f32, 2.0]).unwrap();
        assert!(matches!(read_raster(&flat), Err(Error::InvalidInput(_))));

        let deep = dir.path().join("deep.npy");
        write_npy(&deep, &ArrayD::<f32>::zeros(IxDyn(&[1, 2, 2, 2]))).unwrap();
        assert!(matches!(read_raster(&deep), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn missing_file_is_missing_input() {
        let err = read_raster(Path::new("/nonexistent/ndwi_t1.npy")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn garbage_npy_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.npy");
        fs::write(&path, b"not an npy file").unwrap();
        assert!(read_raster(&path).unwrap_err().is_invalid_input());
    }

    #[test]
    fn parallel_read_keeps_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.npy");
        let b = dir.path().join("b.npy");
        write_npy(&a, &array![[1.0f32]]).unwrap();
        write_npy(&b, &array![[2.0f32, 3.0]]).unwrap();

        let rasters = read_bands_parallel(&[a.as_path(), b.as_path()]).unwrap();
        assert_eq!(rasters[0].shape(), (1, 1));
        assert_eq!(rasters[1].shape(), (1, 2));
    }
}
