// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_bands_parallel, read_raster, BandStack, GeoInfo, Grid, LoadedRaster, RasterValues};
pub use writer::{write_index, write_mask, IndexEncoding};
