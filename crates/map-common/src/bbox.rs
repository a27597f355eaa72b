//! Bounding box types and the lon/lat to pixel mapping used for drawing.

/// A geographic bounding box in degrees (x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut bbox = Self::new(x, y, x, y);
        for (x, y) in iter {
            bbox.expand_to_include(x, y);
        }
        Some(bbox)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the box so that it contains the given point.
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Vertical stretch applied to latitude so that shapes keep their
    /// proportions at the box's mid-latitude: `1 / cos(mid_lat)`.
    pub fn geographic_aspect(&self) -> f64 {
        let (_, mid_lat) = self.center();
        let cos = mid_lat.to_radians().cos();
        if cos.abs() < 1e-6 {
            1.0
        } else {
            1.0 / cos
        }
    }
}

/// Maps lon/lat coordinates into a pixel rectangle, preserving aspect ratio
/// and centering the data inside the rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    bounds: BoundingBox,
    y_aspect: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Fit `bounds` into the pixel rectangle at (`x`, `y`) of size
    /// `width` x `height`.
    ///
    /// Returns `None` when the bounds are degenerate in both directions or the
    /// target rectangle is empty.
    pub fn fit(
        bounds: BoundingBox,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        y_aspect: f64,
    ) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let data_w = bounds.width();
        let data_h = bounds.height() * y_aspect;
        let scale = match (data_w > 0.0, data_h > 0.0) {
            (true, true) => (width / data_w).min(height / data_h),
            (true, false) => width / data_w,
            (false, true) => height / data_h,
            (false, false) => return None,
        };
        if !scale.is_finite() {
            return None;
        }

        let offset_x = x + (width - data_w * scale) / 2.0;
        let offset_y = y + (height - data_h * scale) / 2.0;

        Some(Self {
            bounds,
            y_aspect,
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Project a lon/lat coordinate to pixel space (y grows downwards).
    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let px = self.offset_x + (lon - self.bounds.min_x) * self.scale;
        let py = self.offset_y + (self.bounds.max_y - lat) * self.y_aspect * self.scale;
        (px as f32, py as f32)
    }

    /// Pixels per degree of longitude.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points([(1.0, 5.0), (-3.0, 2.0), (4.0, -1.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, -1.0, 4.0, 5.0));
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_viewport_centers_wide_data() {
        // 20 x 10 degrees into a 100 x 100 square: limited by width
        let bbox = BoundingBox::new(0.0, 0.0, 20.0, 10.0);
        let vp = Viewport::fit(bbox, 0.0, 0.0, 100.0, 100.0, 1.0).unwrap();
        assert_eq!(vp.scale(), 5.0);
        assert_eq!(vp.project(0.0, 10.0), (0.0, 25.0));
        assert_eq!(vp.project(20.0, 0.0), (100.0, 75.0));
    }
}
