//! Vector layers backed by GDAL/OGR.
//!
//! [`VectorLayer`] owns its datasource and always works on layer 0. OGR keeps
//! the spatial filter on the layer handle itself, so every call that changes
//! the filter also resets the read cursor.

use std::path::{Path, PathBuf};

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    field_type_to_name, Feature, Geometry, Layer, LayerAccess, OGRFieldType, OGRwkbGeometryType,
    ToGdal,
};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags, LayerOptions};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::geotransform::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    Writable,
}

/// Name and OGR type of one attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: OGRFieldType::Type,
}

impl FieldSpec {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: OGRFieldType::OFTString,
        }
    }

    pub const fn real(name: &'static str) -> Self {
        Self {
            name,
            kind: OGRFieldType::OFTReal,
        }
    }
}

/// Attribute value written alongside a geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    Real(f64),
}

pub struct VectorLayer {
    path: PathBuf,
    dataset: Dataset,
}

/// OGR driver matching the extension of `path`.
fn driver_name_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("gpkg") => "GPKG",
        Some("geojson") | Some("json") => "GeoJSON",
        _ => "ESRI Shapefile",
    }
}

fn spatial_ref_from_wkt(wkt: &str) -> Result<Option<SpatialRef>> {
    if wkt.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(SpatialRef::from_wkt(wkt)?))
}

impl VectorLayer {
    /// Open an existing datasource.
    pub fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let open_flags = match mode {
            AccessMode::ReadOnly => GdalOpenFlags::GDAL_OF_VECTOR,
            AccessMode::Writable => GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_UPDATE,
        };
        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags,
                ..DatasetOptions::default()
            },
        )
        .map_err(|e| Error::open(path, e))?;
        let vector = Self {
            path: path.to_path_buf(),
            dataset,
        };
        // a datasource without layers is as unusable as a missing one
        vector.layer().map_err(|e| match e {
            Error::Gdal(source) => Error::open(path, source),
            other => other,
        })?;
        Ok(vector)
    }

    /// Reopen `path` for appending when it exists, otherwise create it.
    ///
    /// An existing datasource must already hold every field of `fields` with
    /// the same type; anything else is a [`Error::SchemaMismatch`] and nothing
    /// is written.
    pub fn create_or_reopen(
        path: &Path,
        spatial_ref_wkt: &str,
        geometry_type: OGRwkbGeometryType::Type,
        fields: &[FieldSpec],
    ) -> Result<Self> {
        if path.exists() {
            let vector = Self::open(path, AccessMode::Writable)?;
            vector.check_schema(fields)?;
            debug!("Appending to {}", path.display());
            return Ok(vector);
        }

        let driver = DriverManager::get_driver_by_name(driver_name_for(path))?;
        let dataset = driver.create_vector_only(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("layer")
            .to_string();
        let vector = Self::with_new_layer(path, dataset, &name, spatial_ref_wkt, geometry_type, fields)?;
        info!("Created {}", path.display());
        Ok(vector)
    }

    /// Fresh layer held by the OGR Memory driver.
    pub fn create_in_memory(
        name: &str,
        spatial_ref_wkt: &str,
        geometry_type: OGRwkbGeometryType::Type,
        fields: &[FieldSpec],
    ) -> Result<Self> {
        let driver = DriverManager::get_driver_by_name("Memory")?;
        let dataset = driver.create_vector_only(name)?;
        Self::with_new_layer(
            Path::new(name),
            dataset,
            name,
            spatial_ref_wkt,
            geometry_type,
            fields,
        )
    }

    fn with_new_layer(
        path: &Path,
        mut dataset: Dataset,
        name: &str,
        spatial_ref_wkt: &str,
        geometry_type: OGRwkbGeometryType::Type,
        fields: &[FieldSpec],
    ) -> Result<Self> {
        let srs = spatial_ref_from_wkt(spatial_ref_wkt)?;
        {
            let layer = dataset.create_layer(LayerOptions {
                name,
                srs: srs.as_ref(),
                ty: geometry_type,
                ..Default::default()
            })?;
            let defs: Vec<(&str, OGRFieldType::Type)> =
                fields.iter().map(|f| (f.name, f.kind)).collect();
            layer.create_defn_fields(&defs)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn layer(&self) -> Result<Layer<'_>> {
        Ok(self.dataset.layer(0)?)
    }

    /// Field names and types in schema order.
    pub fn schema(&self) -> Result<Vec<(String, OGRFieldType::Type)>> {
        let layer = self.layer()?;
        let schema = layer
            .defn()
            .fields()
            .map(|field| (field.name(), field.field_type()))
            .collect();
        Ok(schema)
    }

    fn check_schema(&self, fields: &[FieldSpec]) -> Result<()> {
        let schema = self.schema()?;
        for expected in fields {
            let found = schema
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(expected.name));
            match found {
                Some((_, kind)) if *kind == expected.kind => {}
                Some((_, kind)) => {
                    return Err(Error::SchemaMismatch {
                        path: self.path.clone(),
                        field: expected.name.to_string(),
                        expected: field_type_to_name(expected.kind),
                        found: field_type_to_name(*kind),
                    })
                }
                None => {
                    return Err(Error::SchemaMismatch {
                        path: self.path.clone(),
                        field: expected.name.to_string(),
                        expected: field_type_to_name(expected.kind),
                        found: "missing".to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Spatial reference of the layer as WKT, empty when unset.
    pub fn spatial_ref_wkt(&self) -> Result<String> {
        let layer = self.layer()?;
        match layer.spatial_ref() {
            Some(srs) => Ok(srs.to_wkt()?),
            None => Ok(String::new()),
        }
    }

    /// Restrict reads to features intersecting `polygon`.
    /// Replaces any previous filter and rewinds the cursor.
    pub fn set_spatial_filter(&mut self, polygon: &geo::Polygon<f64>) -> Result<()> {
        let filter = polygon.to_gdal()?;
        let mut layer = self.layer()?;
        layer.clear_spatial_filter();
        layer.set_spatial_filter(&filter);
        layer.reset_feature_reading();
        Ok(())
    }

    pub fn set_spatial_filter_bbox(&mut self, bbox: &BoundingBox) -> Result<()> {
        self.set_spatial_filter(&bbox.to_polygon())
    }

    pub fn clear_spatial_filter(&mut self) -> Result<()> {
        let mut layer = self.layer()?;
        layer.clear_spatial_filter();
        layer.reset_feature_reading();
        Ok(())
    }

    /// Number of features passing the current filter.
    pub fn feature_count(&self) -> Result<u64> {
        Ok(self.layer()?.feature_count())
    }

    /// `(fid, geometry)` of every feature passing the current filter, in
    /// layer order.
    pub fn filtered_geometries(&mut self) -> Result<Vec<(Option<u64>, geo::Geometry<f64>)>> {
        let mut layer = self.layer()?;
        layer.reset_feature_reading();
        let mut out = Vec::new();
        for feature in layer.features() {
            let fid = feature.fid();
            let geometry = feature.geometry().ok_or_else(|| Error::GeometryShape {
                fid,
                reason: "feature has no geometry".to_string(),
            })?;
            out.push((fid, geometry.to_geo()?));
        }
        layer.reset_feature_reading();
        Ok(out)
    }

    /// Owned OGR geometries of every feature passing the current filter.
    pub fn ogr_geometries(&mut self) -> Result<Vec<Geometry>> {
        let mut layer = self.layer()?;
        layer.reset_feature_reading();
        let geometries = layer
            .features()
            .filter_map(|feature| feature.geometry().cloned())
            .collect();
        layer.reset_feature_reading();
        Ok(geometries)
    }

    /// Create one feature per geometry, requesting FIDs numbered from 0 for
    /// this call. Drivers may renumber them (a shapefile append continues
    /// after the existing records), so the FIDs actually assigned are
    /// returned.
    pub fn append_features_from_geometries<G: ToGdal>(&mut self, geometries: &[G]) -> Result<Vec<u64>> {
        let layer = self.layer()?;
        let mut fids = Vec::with_capacity(geometries.len());
        for (index, geometry) in geometries.iter().enumerate() {
            let mut feature = Feature::new(layer.defn())?;
            feature.set_geometry(geometry.to_gdal()?)?;
            set_fid(&feature, index as u64)?;
            feature.create(&layer)?;
            fids.push(feature.fid().unwrap_or(index as u64));
        }
        Ok(fids)
    }

    /// Create one feature carrying `geometry` and `attributes`.
    pub fn create_feature<G: ToGdal>(
        &mut self,
        geometry: &G,
        attributes: &[(&str, AttributeValue<'_>)],
    ) -> Result<()> {
        let layer = self.layer()?;
        let mut feature = Feature::new(layer.defn())?;
        for (name, value) in attributes {
            match value {
                AttributeValue::Text(text) => feature.set_field_string(name, text)?,
                AttributeValue::Real(real) => feature.set_field_double(name, *real)?,
            }
        }
        feature.set_geometry(geometry.to_gdal()?)?;
        feature.create(&layer)?;
        Ok(())
    }

    /// Flush pending writes of the layer to its datasource.
    pub fn sync_to_disk(&mut self) -> Result<()> {
        let layer = self.layer()?;
        let rv = unsafe { gdal_sys::OGR_L_SyncToDisk(layer.c_layer()) };
        if rv != gdal_sys::OGRErr::OGRERR_NONE {
            return Err(Error::Vector(format!(
                "failed to sync {} to disk (OGR error {})",
                self.path.display(),
                rv
            )));
        }
        Ok(())
    }

    pub(crate) fn c_layer(&self) -> Result<gdal_sys::OGRLayerH> {
        let layer = self.layer()?;
        Ok(unsafe { layer.c_layer() })
    }
}

fn set_fid(feature: &Feature<'_>, fid: u64) -> Result<()> {
    let rv = unsafe { gdal_sys::OGR_F_SetFID(feature.c_feature(), fid as i64) };
    if rv != gdal_sys::OGRErr::OGRERR_NONE {
        return Err(Error::Vector(format!("cannot assign FID {fid} (OGR error {rv})")));
    }
    Ok(())
}
