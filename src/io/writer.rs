// src/io/writer.rs
use std::path::Path;

use ndarray_npy::write_npy;

use super::reader::GeoInfo;
use crate::error::{Error, Result};
use crate::processing::estimator::WaterMask;
use crate::processing::indices::WaterIndexMap;

/// How an index map is encoded in a GeoTIFF
#[derive(Debug, Clone, Copy)]
pub struct IndexEncoding {
    pub use_fixed_point: bool,
    pub scale_factor: i32,
}

impl Default for IndexEncoding {
    fn default() -> Self {
        Self {
            use_fixed_point: true,
            scale_factor: 10000,
        }
    }
}

fn is_npy(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"))
}

fn npy_write_error(path: &Path, e: ndarray_npy::WriteNpyError) -> Error {
    Error::Npy {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Write a water mask: `.npy` as bool, anything else as a uint8 raster
pub fn write_mask(path: &Path, mask: &WaterMask, geo: Option<&GeoInfo>) -> Result<()> {
    if is_npy(path) {
        write_npy(path, mask).map_err(|e| npy_write_error(path, e))?;
    } else {
        gdal_out::write_mask(path, mask, geo)?;
    }
    log::info!("wrote water mask {}", path.display());
    Ok(())
}

/// Write an NDWI map: `.npy` as float32, anything else per `encoding`
pub fn write_index(
    path: &Path,
    index: &WaterIndexMap,
    geo: Option<&GeoInfo>,
    encoding: IndexEncoding,
) -> Result<()> {
    if is_npy(path) {
        write_npy(path, index).map_err(|e| npy_write_error(path, e))?;
    } else {
        gdal_out::write_index(path, index, geo, encoding)?;
    }
    log::info!("wrote NDWI map {}", path.display());
    Ok(())
}

#[cfg(feature = "gdal")]
mod gdal_out {
    use std::path::Path;

    use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
    use gdal::{Dataset, DriverManager, DriverType, Metadata};

    use super::IndexEncoding;
    use crate::error::{Error, Result};
    use crate::io::reader::GeoInfo;
    use crate::processing::estimator::WaterMask;
    use crate::processing::indices::WaterIndexMap;
    use crate::utils::fixed_point::{
        fill_nodata, to_fixed_point, NODATA_VALUE_FLOAT, NODATA_VALUE_INT,
    };

    fn create<T: GdalType + Copy>(path: &Path, width: usize, height: usize) -> Result<Dataset> {
        let driver = DriverManager::get_output_driver_for_dataset_name(path, DriverType::Raster)
            .ok_or_else(|| {
                Error::InvalidInput(format!("no raster driver for {}", path.display()))
            })?;

        let creation_options =
            RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "NUM_THREADS=ALL_CPUS"]);
        Ok(driver.create_with_band_type_with_options::<T, _>(
            path,
            width,
            height,
            1,
            &creation_options,
        )?)
    }

    fn georeference(dataset: &mut Dataset, geo: Option<&GeoInfo>) -> Result<()> {
        if let Some(geo) = geo {
            dataset.set_projection(&geo.projection)?;
            dataset.set_geo_transform(&geo.geo_transform)?;
        }
        Ok(())
    }

    pub(super) fn write_mask(path: &Path, mask: &WaterMask, geo: Option<&GeoInfo>) -> Result<()> {
        let (height, width) = mask.dim();
        let mut dataset = create::<u8>(path, width, height)?;
        georeference(&mut dataset, geo)?;

        let mut band = dataset.rasterband(1)?;
        band.set_description("water mask")?;
        let data = mask.iter().map(|&w| u8::from(w)).collect();
        let mut buffer = Buffer::new((width, height), data);
        band.write((0, 0), (width, height), &mut buffer)?;
        dataset.flush_cache()?;
        Ok(())
    }

    pub(super) fn write_index(
        path: &Path,
        index: &WaterIndexMap,
        geo: Option<&GeoInfo>,
        encoding: IndexEncoding,
    ) -> Result<()> {
        let (height, width) = index.dim();
        let values = index.as_standard_layout();
        let values = values
            .as_slice()
            .ok_or_else(|| Error::InvalidInput("index map is not contiguous".to_string()))?;

        if encoding.use_fixed_point {
            let mut dataset = create::<i16>(path, width, height)?;
            georeference(&mut dataset, geo)?;

            let mut band = dataset.rasterband(1)?;
            band.set_no_data_value(Some(NODATA_VALUE_INT as f64))?;
            band.set_metadata_item(
                "SCALE",
                &format!("{}", 1.0 / encoding.scale_factor as f64),
                "",
            )?;
            band.set_metadata_item("OFFSET", "0", "")?;
            band.set_description(&format!("NDWI (scaled by {})", encoding.scale_factor))?;

            let fixed = to_fixed_point(values, encoding.scale_factor, NODATA_VALUE_INT);
            let mut buffer = Buffer::new((width, height), fixed);
            band.write((0, 0), (width, height), &mut buffer)?;
            dataset.flush_cache()?;
        } else {
            let mut dataset = create::<f32>(path, width, height)?;
            georeference(&mut dataset, geo)?;

            let mut band = dataset.rasterband(1)?;
            band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
            band.set_description("NDWI")?;

            let mut buffer = Buffer::new((width, height), fill_nodata(values));
            band.write((0, 0), (width, height), &mut buffer)?;
            dataset.flush_cache()?;
        }
        Ok(())
    }
}

#[cfg(not(feature = "gdal"))]
mod gdal_out {
    use std::path::Path;

    use super::IndexEncoding;
    use crate::error::{Error, Result};
    use crate::io::reader::GeoInfo;
    use crate::processing::estimator::WaterMask;
    use crate::processing::indices::WaterIndexMap;

    fn unsupported(path: &Path) -> Error {
        Error::InvalidInput(format!(
            "{}: only .npy outputs are supported without the `gdal` feature",
            path.display()
        ))
    }

    pub(super) fn write_mask(path: &Path, _mask: &WaterMask, _geo: Option<&GeoInfo>) -> Result<()> {
        Err(unsupported(path))
    }

    pub(super) fn write_index(
        path: &Path,
        _index: &WaterIndexMap,
        _geo: Option<&GeoInfo>,
        _encoding: IndexEncoding,
    ) -> Result<()> {
        Err(unsupported(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::reader::read_raster;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn mask_npy_reads_back_as_water() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask_t1.npy");
        let mask = array![[true, false], [false, true]];
        write_mask(&path, &mask, None).unwrap();

        let band = read_raster(&path).unwrap().into_single_band().unwrap();
        assert_eq!(band.into_f32(), array![[1.0f32, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn index_npy_keeps_float_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ndwi.npy");
        let index = array![[0.25f32, -0.5]];
        write_index(&path, &index, None, IndexEncoding::default()).unwrap();

        let band = read_raster(&path).unwrap().into_single_band().unwrap();
        assert!(!band.is_double());
        assert_eq!(band.into_f32(), index);
    }

    #[cfg(not(feature = "gdal"))]
    #[test]
    fn tiff_output_needs_gdal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask.tif");
        let err = write_mask(&path, &array![[true]], None).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
