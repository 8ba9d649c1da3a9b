//! Selection rectangles and the displayed-space / natural-space mapping.
//!
//! Three coordinate systems are in play: *percent space* (selection as
//! percentages of the displayed image, zoom-independent while dragging),
//! *displayed space* (pixels of the image as shown on screen, after zoom)
//! and *natural space* (pixels of the raster itself). Scale factors between
//! displayed and natural space are derived from the two sizes directly, so
//! a selection maps to the same natural-space region at any zoom level.

/// Size at which the raster is currently rendered, after zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub displayed_width: f32,
    pub displayed_height: f32,
    pub scale: f32,
}

impl DisplayGeometry {
    /// Geometry for a raster of the given natural size shown at `scale`.
    pub fn at_scale(natural_width: u32, natural_height: u32, scale: f32) -> Self {
        Self {
            displayed_width: natural_width as f32 * scale,
            displayed_height: natural_height as f32 * scale,
            scale,
        }
    }
}

/// In-progress selection, in percent of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentCrop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PercentCrop {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-width band anchored at the origin, `fraction` of the height tall.
    pub fn band(fraction: f32) -> Self {
        Self::new(0.0, 0.0, 100.0, (fraction * 100.0).clamp(1.0, 100.0))
    }

    /// Clamp into the unit area: sides in `[0, 100]`, `x + width <= 100`,
    /// `y + height <= 100`.
    pub fn clamped(self) -> Self {
        let width = self.width.clamp(0.0, 100.0);
        let height = self.height.clamp(0.0, 100.0);
        Self {
            x: self.x.clamp(0.0, 100.0 - width),
            y: self.y.clamp(0.0, 100.0 - height),
            width,
            height,
        }
    }

    /// Convert to displayed-space pixels for the given geometry.
    pub fn to_pixels(&self, display: &DisplayGeometry) -> PixelCrop {
        PixelCrop {
            x: self.x / 100.0 * display.displayed_width,
            y: self.y / 100.0 * display.displayed_height,
            width: self.width / 100.0 * display.displayed_width,
            height: self.height / 100.0 * display.displayed_height,
        }
    }
}

/// Completed selection, in displayed-space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCrop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelCrop {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Clamp into `[0, displayed_width] x [0, displayed_height]`.
    pub fn clamp_to_display(self, display: &DisplayGeometry) -> Self {
        let x = self.x.clamp(0.0, display.displayed_width);
        let y = self.y.clamp(0.0, display.displayed_height);
        Self {
            x,
            y,
            width: self.width.clamp(0.0, display.displayed_width - x),
            height: self.height.clamp(0.0, display.displayed_height - y),
        }
    }

    /// Map into the raster's pixel grid.
    ///
    /// The scale factors come from the natural and displayed sizes, not from
    /// the zoom factor, so the mapping holds at any zoom level.
    pub fn to_natural(
        &self,
        natural_width: u32,
        natural_height: u32,
        display: &DisplayGeometry,
    ) -> NaturalRect {
        let sx = natural_width as f32 / display.displayed_width;
        let sy = natural_height as f32 / display.displayed_height;
        NaturalRect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// Selection mapped into the raster's own pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NaturalRect {
    /// Intersect with `[0, width] x [0, height]`; `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<NaturalRect> {
        let x0 = self.x.max(0.0);
        let y0 = self.y.max(0.0);
        let x1 = (self.x + self.width).min(width as f32);
        let y1 = (self.y + self.height).min(height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(NaturalRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_is_full_width() {
        let band = PercentCrop::band(0.25);
        assert_eq!(band, PercentCrop::new(0.0, 0.0, 100.0, 25.0));
    }

    #[test]
    fn band_fraction_is_bounded() {
        assert_eq!(PercentCrop::band(3.0).height, 100.0);
        assert_eq!(PercentCrop::band(0.0).height, 1.0);
    }

    #[test]
    fn percent_clamp_keeps_rect_inside() {
        let rect = PercentCrop::new(80.0, -10.0, 40.0, 120.0).clamped();
        assert_eq!(rect.x + rect.width, 100.0);
        assert_eq!(rect.y, 0.0);
        assert_eq!(rect.height, 100.0);
    }

    #[test]
    fn percent_to_pixels_scales_with_display() {
        let display = DisplayGeometry::at_scale(800, 1000, 1.0);
        let rect = PercentCrop::band(0.25).to_pixels(&display);
        assert_eq!(rect, PixelCrop::new(0.0, 0.0, 800.0, 250.0));
    }

    #[test]
    fn natural_mapping_is_zoom_invariant() {
        // The same percent selection, realized at two zoom levels, must land
        // on the same natural-space rectangle.
        let selection = PercentCrop::new(10.0, 5.0, 50.0, 20.0);
        let full = DisplayGeometry::at_scale(800, 1000, 1.0);
        let half = DisplayGeometry::at_scale(800, 1000, 0.5);

        let at_full = selection.to_pixels(&full).to_natural(800, 1000, &full);
        let at_half = selection.to_pixels(&half).to_natural(800, 1000, &half);

        assert!((at_full.x - at_half.x).abs() < 1e-3);
        assert!((at_full.y - at_half.y).abs() < 1e-3);
        assert!((at_full.width - at_half.width).abs() < 1e-3);
        assert!((at_full.height - at_half.height).abs() < 1e-3);
    }

    #[test]
    fn displayed_rect_maps_through_zoom_to_natural_pixels() {
        // Half-zoom display: 400x500. A 350x100 displayed rect covers
        // 700x200 natural pixels.
        let display = DisplayGeometry::at_scale(800, 1000, 0.5);
        let natural = PixelCrop::new(25.0, 25.0, 350.0, 100.0).to_natural(800, 1000, &display);
        assert_eq!(
            natural,
            NaturalRect {
                x: 50.0,
                y: 50.0,
                width: 700.0,
                height: 200.0
            }
        );
    }

    #[test]
    fn clamp_to_display_limits_size() {
        let display = DisplayGeometry::at_scale(800, 1000, 1.0);
        let rect = PixelCrop::new(700.0, -20.0, 400.0, 100.0).clamp_to_display(&display);
        assert_eq!(rect.x, 700.0);
        assert_eq!(rect.width, 100.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn natural_clamp_drops_empty_rects() {
        let outside = NaturalRect {
            x: 900.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        };
        assert!(outside.clamp_to(800, 1000).is_none());

        let partial = NaturalRect {
            x: 780.0,
            y: -10.0,
            width: 50.0,
            height: 50.0,
        };
        let clamped = partial.clamp_to(800, 1000).unwrap();
        assert_eq!(clamped.width, 20.0);
        assert_eq!(clamped.y, 0.0);
        assert_eq!(clamped.height, 40.0);
    }
}
