//! Raster datasets backed by GDAL.
//!
//! A [`Raster`] owns its dataset handle, so a tile is closed as soon as the
//! value goes out of scope, including on early return.

use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, GdalType};
use gdal::{Dataset, DriverManager};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::geotransform::{BoundingBox, GeoTransform};

/// `(bands, width, height)` of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterShape {
    pub bands: usize,
    pub width: usize,
    pub height: usize,
}

impl RasterShape {
    pub fn new(bands: usize, width: usize, height: usize) -> Self {
        Self {
            bands,
            width,
            height,
        }
    }

    pub fn band_len(&self) -> usize {
        self.width * self.height
    }
}

/// Band-major pixel data sized `bands x height x width`.
#[derive(Debug, Clone)]
pub struct RasterArray<T> {
    pub shape: RasterShape,
    pub data: Vec<T>,
}

impl<T: Copy> RasterArray<T> {
    /// Pixels of band `index` (0-based), row-major.
    pub fn band(&self, index: usize) -> &[T] {
        let len = self.shape.band_len();
        &self.data[index * len..(index + 1) * len]
    }

    pub fn get(&self, band: usize, row: usize, col: usize) -> T {
        self.data[band * self.shape.band_len() + row * self.shape.width + col]
    }
}

pub struct Raster {
    path: PathBuf,
    dataset: Dataset,
}

impl Raster {
    /// Open an existing raster read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = Dataset::open(path).map_err(|e| Error::open(path, e))?;
        let raster = Self {
            path: path.to_path_buf(),
            dataset,
        };
        if let Ok(gt) = raster.geo_transform() {
            if !gt.is_north_up() {
                warn!(
                    "{} is not a north-up raster; pixel conversions assume no rotation",
                    path.display()
                );
            }
        }
        Ok(raster)
    }

    fn from_dataset(path: &Path, dataset: Dataset) -> Self {
        Self {
            path: path.to_path_buf(),
            dataset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    pub fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(GeoTransform::from_gdal(&self.dataset.geo_transform()?))
    }

    /// Spatial reference as WKT; empty when the raster carries none.
    pub fn projection(&self) -> String {
        self.dataset.projection()
    }

    pub fn shape(&self) -> RasterShape {
        let (width, height) = self.dataset.raster_size();
        RasterShape::new(self.dataset.raster_count() as usize, width, height)
    }

    /// World extent of the whole raster.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        let shape = self.shape();
        Ok(self
            .geo_transform()?
            .pixel_extent_to_world(shape.width, shape.height))
    }

    /// Read every band into one band-major array.
    pub fn read_array<T: Copy + GdalType>(&self) -> Result<RasterArray<T>> {
        let shape = self.shape();
        let mut data = Vec::with_capacity(shape.bands * shape.band_len());
        for index in 1..=shape.bands {
            let band = self.dataset.rasterband(index as isize)?;
            let buffer = band.read_band_as::<T>()?;
            data.extend(buffer.data);
        }
        Ok(RasterArray { shape, data })
    }

    /// Per-band `(min, max)` from GDAL statistics, approximate when GDAL
    /// prefers sampling. Nodata pixels are ignored; a band with no valid
    /// pixel, or whose statistics cannot be computed, yields `None`.
    pub fn band_min_max(&self) -> Result<Vec<Option<(f64, f64)>>> {
        let shape = self.shape();
        let mut stats = Vec::with_capacity(shape.bands);
        for index in 1..=shape.bands {
            let band = self.dataset.rasterband(index as isize)?;
            // GDAL fails, rather than warns, when every sampled pixel is nodata
            let min_max = match band.get_statistics(true, true) {
                Ok(Some(stats)) => Some((stats.min, stats.max)),
                Ok(None) => None,
                Err(e) => {
                    debug!("{} band {}: no statistics: {}", self.path.display(), index, e);
                    None
                }
            };
            stats.push(min_max);
        }
        Ok(stats)
    }
}

/// Open `path` and return its pixels, geotransform, projection and handle.
pub fn read_array<T: Copy + GdalType>(
    path: &Path,
) -> Result<(RasterArray<T>, GeoTransform, String, Raster)> {
    let raster = Raster::open(path)?;
    let array = raster.read_array::<T>()?;
    let gt = raster.geo_transform()?;
    let projection = raster.projection();
    Ok((array, gt, projection, raster))
}

fn apply_georeferencing(dataset: &mut Dataset, gt: &GeoTransform, projection: &str) -> Result<()> {
    dataset.set_geo_transform(&gt.to_gdal())?;
    if !projection.is_empty() {
        dataset.set_projection(projection)?;
    }
    Ok(())
}

/// Create an Int32 GeoTIFF sized from `shape` with no pixel data written.
/// Used as the target of rasterization.
pub fn create_empty(
    path: &Path,
    gt: &GeoTransform,
    projection: &str,
    shape: RasterShape,
) -> Result<Raster> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<i32, _>(
        path,
        shape.width as isize,
        shape.height as isize,
        shape.bands as isize,
    )?;
    apply_georeferencing(&mut dataset, gt, projection)?;
    debug!(
        "Created empty {}x{}x{} raster {}",
        shape.bands,
        shape.width,
        shape.height,
        path.display()
    );
    Ok(Raster::from_dataset(path, dataset))
}

/// Write `data` as band 1 of a UInt16 GeoTIFF.
///
/// The output type is always UInt16 whatever `T` is. Values are cast with
/// Rust's saturating float-to-int conversion: negatives become 0, values above
/// 65535 become 65535, fractions are truncated and NaN becomes 0.
/// The dataset is closed, and therefore flushed, before returning.
pub fn write_single_band<T: Copy + Into<f64>>(
    path: &Path,
    data: &[T],
    gt: &GeoTransform,
    projection: &str,
    shape: RasterShape,
) -> Result<()> {
    if data.len() != shape.band_len() {
        return Err(Error::Raster(format!(
            "band of {} pixels does not fit a {}x{} raster",
            data.len(),
            shape.width,
            shape.height
        )));
    }
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<u16, _>(
        path,
        shape.width as isize,
        shape.height as isize,
        shape.bands.max(1) as isize,
    )?;
    apply_georeferencing(&mut dataset, gt, projection)?;
    write_u16_band(&dataset, data, shape)?;
    // closing the dataset flushes it
    drop(dataset);
    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_u16_band<T: Copy + Into<f64>>(
    dataset: &Dataset,
    data: &[T],
    shape: RasterShape,
) -> Result<()> {
    let pixels: Vec<u16> = data.iter().map(|&v| Into::<f64>::into(v) as u16).collect();
    let buffer = Buffer::new((shape.width, shape.height), pixels);
    let mut band = dataset.rasterband(1)?;
    band.write((0, 0), (shape.width, shape.height), &buffer)?;
    Ok(())
}

/// Single-band UInt16 raster held in memory by the MEM driver.
pub fn in_memory_u16<T: Copy + Into<f64>>(
    data: &[T],
    gt: &GeoTransform,
    projection: &str,
    width: usize,
    height: usize,
) -> Result<Raster> {
    let shape = RasterShape::new(1, width, height);
    if data.len() != shape.band_len() {
        return Err(Error::Raster(format!(
            "mask of {} pixels does not fit a {}x{} raster",
            data.len(),
            width,
            height
        )));
    }
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset =
        driver.create_with_band_type::<u16, _>("", width as isize, height as isize, 1)?;
    apply_georeferencing(&mut dataset, gt, projection)?;
    write_u16_band(&dataset, data, shape)?;
    Ok(Raster::from_dataset(Path::new(""), dataset))
}
