//! Per-tile COCO annotation building.
//!
//! An [`AnnotationSession`] owns the image and annotation id counters and the
//! accumulated records of one run. Tiles are processed strictly one after
//! the other; the document is rewritten after every tile that holds objects.

use std::path::Path;

use geo::{Area, BoundingRect, Polygon};
use log::{debug, warn};

use crate::coco::{Annotation, AnnotationAttributes, CocoFile, DatasetConfig, Image, Info};
use crate::error::{Error, Result};
use crate::geotransform::{BoundingBox, GeoTransform};
use crate::raster::Raster;
use crate::vector::VectorLayer;

/// Where a tile goes after its ground-truth check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileClass {
    WithObjects,
    WithoutObjects,
}

/// Receives each classified tile. The production implementation moves the
/// file, see [`crate::io::MoveRouter`].
pub trait TileRouter {
    fn route(&self, tile: &Path, class: TileClass) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    WithObjects { image_id: u64, annotations: usize },
    WithoutObjects,
}

/// Pixel-space view of one ground-truth polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelAnnotation {
    /// Flattened `[col0, row0, col1, row1, ...]` of the exterior ring.
    pub segmentation: Vec<i64>,
    pub bbox: [i64; 4],
    /// Planar area in world units.
    pub area: f64,
}

/// Accept a polygon without holes, or a multipolygon with a single such part.
pub fn single_ring_polygon(fid: Option<u64>, geometry: geo::Geometry<f64>) -> Result<Polygon<f64>> {
    let polygon = match geometry {
        geo::Geometry::Polygon(polygon) => polygon,
        geo::Geometry::MultiPolygon(mut multi) if multi.0.len() == 1 => multi.0.remove(0),
        geo::Geometry::MultiPolygon(multi) => {
            return Err(Error::GeometryShape {
                fid,
                reason: format!("multipolygon with {} parts", multi.0.len()),
            })
        }
        other => {
            return Err(Error::GeometryShape {
                fid,
                reason: format!("expected a polygon, found {}", geometry_kind(&other)),
            })
        }
    };
    if !polygon.interiors().is_empty() {
        return Err(Error::GeometryShape {
            fid,
            reason: format!("polygon with {} holes", polygon.interiors().len()),
        });
    }
    Ok(polygon)
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "point",
        geo::Geometry::Line(_) => "line",
        geo::Geometry::LineString(_) => "linestring",
        geo::Geometry::Polygon(_) => "polygon",
        geo::Geometry::MultiPoint(_) => "multipoint",
        geo::Geometry::MultiLineString(_) => "multilinestring",
        geo::Geometry::MultiPolygon(_) => "multipolygon",
        geo::Geometry::GeometryCollection(_) => "geometry collection",
        geo::Geometry::Rect(_) => "rect",
        geo::Geometry::Triangle(_) => "triangle",
    }
}

/// Convert a world-space polygon to its COCO segmentation, bbox and area.
///
/// Vertices keep their order, closing vertex included. Negative pixel
/// coordinates (objects clipped by the tile edge) are clamped to 0. The bbox
/// pairs the envelope's `(min_x, max_y)` corner with its `(max_x, min_y)`
/// corner because rows grow downwards.
pub fn polygon_to_pixels(gt: &GeoTransform, polygon: &Polygon<f64>) -> PixelAnnotation {
    let segmentation = polygon
        .exterior()
        .coords()
        .flat_map(|c| {
            let (col, row) = gt.world_to_pixel(c.x, c.y);
            [col.max(0), row.max(0)]
        })
        .collect();

    let bbox = match polygon.bounding_rect() {
        Some(rect) => {
            let envelope = BoundingBox::from_rect(&rect);
            let (x0, y0) = gt.world_to_pixel(envelope.x_left, envelope.y_top);
            let (x1, y1) = gt.world_to_pixel(envelope.x_right, envelope.y_bottom);
            [x0, y0, x1 - x0, y1 - y0]
        }
        None => [0, 0, 0, 0],
    };

    PixelAnnotation {
        segmentation,
        bbox,
        area: polygon.unsigned_area(),
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationSession {
    config: DatasetConfig,
    next_image_id: u64,
    next_annotation_id: u64,
    images: Vec<Image>,
    annotations: Vec<Annotation>,
}

impl AnnotationSession {
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            next_image_id: 0,
            next_annotation_id: 0,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn next_image_id(&self) -> u64 {
        self.next_image_id
    }

    pub fn next_annotation_id(&self) -> u64 {
        self.next_annotation_id
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Snapshot of the full document.
    pub fn document(&self) -> CocoFile {
        CocoFile {
            licenses: self.config.licenses(),
            info: Info::default(),
            categories: self.config.categories(),
            images: self.images.clone(),
            annotations: self.annotations.clone(),
        }
    }

    pub fn write_checkpoint(&self, path: &Path) -> Result<()> {
        self.document().write(path)?;
        debug!(
            "Checkpoint {}: {} images, {} annotations",
            path.display(),
            self.images.len(),
            self.annotations.len()
        );
        Ok(())
    }

    /// Classify one tile against `ground_truth` and record its annotations.
    ///
    /// The session only changes once every intersecting feature converted
    /// and the tile was routed, so a failing tile leaves no partial records.
    pub fn process_tile(
        &mut self,
        tile: &Path,
        ground_truth: &mut VectorLayer,
        router: &dyn TileRouter,
        output_json: &Path,
    ) -> Result<TileOutcome> {
        let file_name = tile
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Config(format!("invalid tile path {}", tile.display())))?
            .to_string();

        let (gt, width, height, bbox) = {
            let raster = Raster::open(tile)?;
            let shape = raster.shape();
            (
                raster.geo_transform()?,
                shape.width,
                shape.height,
                raster.bounding_box()?,
            )
        };

        ground_truth.set_spatial_filter_bbox(&bbox)?;
        if ground_truth.feature_count()? == 0 {
            debug!("{file_name}: no intersecting objects");
            router.route(tile, TileClass::WithoutObjects)?;
            return Ok(TileOutcome::WithoutObjects);
        }

        let image_id = self.next_image_id;
        let mut annotation_id = self.next_annotation_id;
        let mut annotations = Vec::new();
        for (fid, geometry) in ground_truth.filtered_geometries()? {
            let polygon = single_ring_polygon(fid, geometry)?;
            let pixels = polygon_to_pixels(&gt, &polygon);
            if pixels.segmentation.len() < 6 {
                warn!("{file_name}: feature {fid:?} has a degenerate ring");
            }
            annotations.push(Annotation {
                id: annotation_id,
                image_id,
                category_id: self.config.category_id,
                segmentation: vec![pixels.segmentation],
                area: pixels.area,
                bbox: pixels.bbox,
                iscrowd: 0,
                attributes: AnnotationAttributes::default(),
            });
            annotation_id += 1;
        }

        router.route(tile, TileClass::WithObjects)?;

        let count = annotations.len();
        self.images.push(Image::new(
            image_id,
            file_name.clone(),
            width as u32,
            height as u32,
            self.config.license_id,
        ));
        self.annotations.extend(annotations);
        self.next_annotation_id = annotation_id;
        self.next_image_id += 1;

        self.write_checkpoint(output_json)?;
        debug!("{file_name}: image {image_id} with {count} annotations");
        Ok(TileOutcome::WithObjects {
            image_id,
            annotations: count,
        })
    }
}
