//! Conversions between vector layers and raster masks.

use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::vector::{OGRFieldType, OGRwkbGeometryType};
use geo::{Coord, Polygon};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::geotransform::GeoTransform;
use crate::raster::{self, Raster, RasterShape};
use crate::vector::{AttributeValue, FieldSpec, VectorLayer};

/// Schema of persisted prediction layers.
pub const PREDICTION_FIELDS: [FieldSpec; 3] = [
    FieldSpec::string("submitname"),
    FieldSpec::string("weightname"),
    FieldSpec::real("proba"),
];

/// Per-run attributes stamped on every persisted polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttributes {
    pub submit_name: String,
    pub weight_name: String,
}

/// Burn every geometry of `layer` into band 1 of a new Int32 GeoTIFF at
/// `path`. Pixels whose centre falls inside a geometry get `burn_value`;
/// there is no anti-aliasing or partial coverage.
pub fn rasterize(
    layer: &mut VectorLayer,
    path: &Path,
    gt: &GeoTransform,
    projection: &str,
    shape: RasterShape,
    burn_value: f64,
) -> Result<Raster> {
    let mut target = raster::create_empty(path, gt, projection, shape)?;
    let geometries = layer.ogr_geometries()?;
    if !geometries.is_empty() {
        let burn_values = vec![burn_value; geometries.len()];
        gdal::raster::rasterize(target.dataset_mut(), &[1], &geometries, &burn_values, None)?;
    }
    debug!(
        "Burned {} geometries into {}",
        geometries.len(),
        path.display()
    );
    Ok(target)
}

/// Write `geometries` into a fresh layer and rasterize it with burn value 1
/// into `<name>.tif`. The layer lives in memory or in `<name>.shp`.
pub fn geometries_to_mask(
    name: &Path,
    projection: &str,
    gt: &GeoTransform,
    shape: RasterShape,
    geometries: &[Polygon<f64>],
    in_memory: bool,
) -> Result<Raster> {
    let mut layer = if in_memory {
        let layer_name = name
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mask");
        VectorLayer::create_in_memory(layer_name, projection, OGRwkbGeometryType::wkbPolygon, &[])?
    } else {
        VectorLayer::create_or_reopen(
            &name.with_extension("shp"),
            projection,
            OGRwkbGeometryType::wkbPolygon,
            &[],
        )?
    };
    layer.append_features_from_geometries(geometries)?;
    rasterize(&mut layer, &name.with_extension("tif"), gt, projection, shape, 1.0)
}

/// Trace 8-connected regions of equal non-masked value in band 1 of
/// `raster` into polygons.
///
/// `mask` defaults to the band itself, so zero pixels never form a region.
/// Polygons come back in raster scan order of each region's first pixel
/// (topmost row, then leftmost column). Callers pairing polygons with
/// per-region values must order those values the same way.
pub fn polygonize(raster: &Raster, mask: Option<&Raster>) -> Result<Vec<Polygon<f64>>> {
    let gt = raster.geo_transform()?;
    let projection = raster.projection();
    let mut scratch = VectorLayer::create_in_memory(
        "polygonized",
        &projection,
        OGRwkbGeometryType::wkbPolygon,
        &[FieldSpec {
            name: "value",
            kind: OGRFieldType::OFTInteger,
        }],
    )?;

    let band = raster.dataset().rasterband(1)?;
    let mask_band = match mask {
        Some(mask) => mask.dataset().rasterband(1)?,
        None => raster.dataset().rasterband(1)?,
    };
    let mut options = CslStringList::new();
    options.set_name_value("8CONNECTED", "8")?;

    let out_layer = scratch.c_layer()?;
    let rv = unsafe {
        gdal_sys::GDALPolygonize(
            band.c_rasterband(),
            mask_band.c_rasterband(),
            out_layer,
            0,
            options.as_ptr() as *mut *mut std::os::raw::c_char,
            None,
            std::ptr::null_mut(),
        )
    };
    if rv != gdal_sys::CPLErr::CE_None {
        return Err(Error::Raster(format!(
            "polygonize failed on {} (CPL error {})",
            raster.path().display(),
            rv
        )));
    }

    let mut polygons = Vec::new();
    for (_, geometry) in scratch.filtered_geometries()? {
        match geometry {
            geo::Geometry::Polygon(polygon) => polygons.push(polygon),
            geo::Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
            _ => {}
        }
    }
    polygons.sort_by_key(|polygon| first_pixel(&gt, polygon));
    debug!("Polygonized {} regions", polygons.len());
    Ok(polygons)
}

/// `(row, col)` of the first pixel of a traced region met in scan order.
/// Region outlines run along pixel edges, so the top-left corner of that
/// pixel is the leftmost vertex on the topmost edge.
fn first_pixel(gt: &GeoTransform, polygon: &Polygon<f64>) -> (i64, i64) {
    let to_grid = |c: &Coord<f64>| {
        let col = ((c.x - gt.origin_x) / gt.pixel_width).round() as i64;
        let row = ((c.y - gt.origin_y) / gt.pixel_height).round() as i64;
        (row, col)
    };
    polygon
        .exterior()
        .coords()
        .map(to_grid)
        .min()
        .unwrap_or((i64::MAX, i64::MAX))
}

/// Append one feature per polygon to `output`, creating it when missing.
///
/// `probabilities[i]` is written as `proba` of `polygons[i]`. The layer is
/// synced after every feature. Returns the number of features written.
pub fn persist_polygons(
    polygons: &[Polygon<f64>],
    probabilities: &[f64],
    attributes: &SubmissionAttributes,
    spatial_ref_wkt: &str,
    output: &Path,
) -> Result<usize> {
    if probabilities.len() < polygons.len() {
        return Err(Error::ProbabilityCount {
            polygons: polygons.len(),
            probabilities: probabilities.len(),
        });
    }
    let mut layer = VectorLayer::create_or_reopen(
        output,
        spatial_ref_wkt,
        OGRwkbGeometryType::wkbMultiPolygon,
        &PREDICTION_FIELDS,
    )?;
    for (polygon, &proba) in polygons.iter().zip(probabilities) {
        debug!("Writing polygon with proba {proba}");
        layer.create_feature(
            polygon,
            &[
                ("proba", AttributeValue::Real(proba)),
                ("submitname", AttributeValue::Text(&attributes.submit_name)),
                ("weightname", AttributeValue::Text(&attributes.weight_name)),
            ],
        )?;
        layer.sync_to_disk()?;
    }
    info!(
        "Persisted {} polygons to {}",
        polygons.len(),
        output.display()
    );
    Ok(polygons.len())
}

/// Polygonize a prediction mask georeferenced like `reference` and persist
/// the regions with their probabilities.
pub fn mask_to_polygons(
    reference: &Path,
    mask: &[u16],
    width: usize,
    height: usize,
    attributes: &SubmissionAttributes,
    probabilities: &[f64],
    output: &Path,
) -> Result<usize> {
    let (gt, projection) = {
        let reference = Raster::open(reference)?;
        (reference.geo_transform()?, reference.projection())
    };
    let mask_raster = raster::in_memory_u16(mask, &gt, &projection, width, height)?;
    let polygons = polygonize(&mask_raster, None)?;
    persist_polygons(&polygons, probabilities, attributes, &projection, output)
}
