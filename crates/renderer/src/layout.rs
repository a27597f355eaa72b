//! Placement of the title, map area and colorbar within the image.

use map_common::{MapError, MapResult};

/// Smallest width or height a map can be laid out in.
pub const MIN_IMAGE_SIZE: u32 = 32;

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Title band on top, map in the middle, colorbar along the bottom.
///
/// All sizes scale with the image height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub title: PixelRect,
    pub map: PixelRect,
    pub colorbar: PixelRect,
    pub title_size: f32,
    pub label_size: f32,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> MapResult<Self> {
        let w = width as f32;
        let h = height as f32;

        let pad = h * 0.03;
        let title_size = h * 0.042;
        let label_size = h * 0.024;
        let bar_height = h * 0.035;
        let tick_len = (label_size * 0.4).max(2.0);

        let title = PixelRect::new(pad, pad, w - 2.0 * pad, title_size);

        let bar_y = h - pad - label_size - tick_len - bar_height;
        let map_y = title.bottom() + pad;
        let map = PixelRect::new(pad, map_y, w - 2.0 * pad, bar_y - pad - map_y);

        let bar_width = (map.width * 0.6).round();
        let colorbar = PixelRect::new(
            (map.center_x() - bar_width / 2.0).round(),
            bar_y.round(),
            bar_width,
            bar_height.round().max(1.0),
        );

        if width < MIN_IMAGE_SIZE
            || height < MIN_IMAGE_SIZE
            || map.width < 1.0
            || map.height < 1.0
            || colorbar.width < 1.0
        {
            return Err(MapError::Render(format!(
                "image {}x{} is too small for a map",
                width, height
            )));
        }

        Ok(Self {
            title,
            map,
            colorbar,
            title_size,
            label_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_stack_without_overlap() {
        let layout = Layout::new(1000, 600).unwrap();
        assert!(layout.title.bottom() < layout.map.y);
        assert!(layout.map.bottom() < layout.colorbar.y);
        assert!(layout.colorbar.bottom() < 600.0);
        assert!(layout.map.right() <= 1000.0);
    }

    #[test]
    fn test_colorbar_is_centered_and_shrunk() {
        let layout = Layout::new(1000, 600).unwrap();
        let expected = (layout.map.width * 0.6).round();
        assert_eq!(layout.colorbar.width, expected);
        assert!((layout.colorbar.center_x() - layout.map.center_x()).abs() <= 1.0);
    }

    #[test]
    fn test_tiny_image_rejected() {
        assert!(Layout::new(2, 2).is_err());
        assert!(Layout::new(1000, 31).is_err());
        assert!(Layout::new(MIN_IMAGE_SIZE, MIN_IMAGE_SIZE).is_ok());
    }
}
