//! Affine world/pixel conversions for north-up rasters.
//!
//! A geotransform holds the six GDAL coefficients
//! `(origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height)`.
//! Only non-rotated imagery is supported, so the rotation terms are carried
//! but never applied.

use geo::{coord, LineString, Polygon, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub rot_x: f64,
    pub origin_y: f64,
    pub rot_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            origin_x: gt[0],
            pixel_width: gt[1],
            rot_x: gt[2],
            origin_y: gt[3],
            rot_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.rot_x,
            self.origin_y,
            self.rot_y,
            self.pixel_height,
        ]
    }

    /// Positive pixel width, negative pixel height and no rotation.
    pub fn is_north_up(&self) -> bool {
        self.pixel_width > 0.0 && self.pixel_height < 0.0 && self.rot_x == 0.0 && self.rot_y == 0.0
    }

    /// Pixel (column, row) holding the world coordinate `(x, y)`.
    ///
    /// Both axes truncate toward zero, so points just outside the left or top
    /// edge land on index 0 rather than -1. Callers that clamp rely on this.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.origin_x) / self.pixel_width).trunc() as i64;
        let row = ((y - self.origin_y) / self.pixel_height).trunc() as i64;
        (col, row)
    }

    /// World extent covered by `cols` x `rows` pixels from the origin.
    pub fn pixel_extent_to_world(&self, cols: usize, rows: usize) -> BoundingBox {
        let x_left = self.origin_x;
        let y_top = self.origin_y;
        BoundingBox {
            x_left,
            x_right: x_left + cols as f64 * self.pixel_width,
            y_top,
            y_bottom: y_top + rows as f64 * self.pixel_height,
        }
    }

    /// Area of one pixel in world units.
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self::from_gdal(&gt)
    }
}

/// Axis-aligned extent in world units. `y_bottom` is numerically smaller than
/// `y_top` even though the pixel height is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_left: f64,
    pub x_right: f64,
    pub y_top: f64,
    pub y_bottom: f64,
}

impl BoundingBox {
    pub fn new(x_left: f64, x_right: f64, y_top: f64, y_bottom: f64) -> Self {
        Self {
            x_left,
            x_right,
            y_top,
            y_bottom,
        }
    }

    /// Envelope of a geometry.
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        Self {
            x_left: rect.min().x,
            x_right: rect.max().x,
            y_top: rect.max().y,
            y_bottom: rect.min().y,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_right - self.x_left
    }

    pub fn height(&self) -> f64 {
        self.y_top - self.y_bottom
    }

    /// Closed ring starting at the top-left corner and running down the left
    /// edge first.
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring = LineString::new(vec![
            coord! { x: self.x_left, y: self.y_top },
            coord! { x: self.x_left, y: self.y_bottom },
            coord! { x: self.x_right, y: self.y_bottom },
            coord! { x: self.x_right, y: self.y_top },
            coord! { x: self.x_left, y: self.y_top },
        ]);
        Polygon::new(ring, vec![])
    }
}
