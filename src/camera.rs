//! Map camera: pan/zoom state and conversions between the three coordinate
//! spaces. Map meters are model space (y grows north), map pixels span the
//! full map image (y grows down), and viewport pixels are on screen.
//!
//! The spaces are related by `map_scale` (pixels per meter, fixed by the map
//! image and extent), `viewport_factor` (fits the image to the viewport at
//! zoom 1), the user `zoom`, and `viewport_origin` (pan offset in map-pixel
//! units). Forward and inverse conversions are exact inverses up to
//! floating-point rounding.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
use crate::model::MapBounds;

/// A point in map-pixel or viewport-pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Camera state for pan/zoom over a fixed-extent map.
#[derive(Debug, Clone, Copy)]
pub struct MapCamera {
    /// Top-left corner of the map in meters: `(x_min, y_max)`.
    origin_m: Point,
    map_width_m: f64,
    image_width_px: f64,
    image_height_px: f64,
    viewport_width_px: f64,
    viewport_height_px: f64,
    /// Pan offset in map-pixel units. Never negative.
    pub viewport_origin: Point,
    viewport_factor: f64,
    zoom: f64,
}

impl Default for MapCamera {
    fn default() -> Self {
        Self {
            origin_m: Point::new(0.0, 0.0),
            map_width_m: 1.0,
            image_width_px: 1.0,
            image_height_px: 1.0,
            viewport_width_px: 1.0,
            viewport_height_px: 1.0,
            viewport_origin: Point::new(0.0, 0.0),
            viewport_factor: 1.0,
            zoom: ZOOM_MIN,
        }
    }
}

impl MapCamera {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Configuration ───────────────────────────────────────────

    /// Set the map extent in meters. The origin becomes `(x_min, y_max)`,
    /// the top-left corner in pixel terms.
    pub fn set_map_bounds(&mut self, bounds: &MapBounds) {
        self.origin_m = Point::new(bounds.x_min, bounds.y_max);
        self.map_width_m = bounds.width();
    }

    /// Set the map image size in pixels and refit to the viewport.
    pub fn set_image_size(&mut self, width_px: f64, height_px: f64) {
        if width_px > 0.0 && height_px > 0.0 {
            self.image_width_px = width_px;
            self.image_height_px = height_px;
        }
        self.refit();
    }

    /// Set the viewport size in pixels and refit. Called on resize.
    pub fn set_viewport_size(&mut self, width_px: f64, height_px: f64) {
        if width_px > 0.0 && height_px > 0.0 {
            self.viewport_width_px = width_px;
            self.viewport_height_px = height_px;
        }
        self.refit();
    }

    /// Recompute the fit factor so the whole image shows at zoom 1.
    fn refit(&mut self) {
        let w_factor = self.viewport_width_px / self.image_width_px;
        let h_factor = self.viewport_height_px / self.image_height_px;
        self.viewport_factor = w_factor.min(h_factor);
    }

    // ── Scales ──────────────────────────────────────────────────

    /// Pixels per meter on the full map image.
    #[must_use]
    pub fn map_scale(&self) -> f64 {
        self.image_width_px / self.map_width_m
    }

    /// Combined map-pixel → viewport-pixel scale.
    #[must_use]
    pub fn display_factor(&self) -> f64 {
        self.viewport_factor * self.zoom
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn viewport_factor(&self) -> f64 {
        self.viewport_factor
    }

    // ── Conversions ─────────────────────────────────────────────

    /// Viewport pixels → map pixels.
    #[must_use]
    pub fn viewport_to_map_px(&self, vp: Point) -> Point {
        Point {
            x: vp.x / self.display_factor() + self.viewport_origin.x,
            y: vp.y / self.display_factor() + self.viewport_origin.y,
        }
    }

    /// Map pixels → viewport pixels.
    #[must_use]
    pub fn map_px_to_viewport(&self, map_px: Point) -> Point {
        Point {
            x: (map_px.x - self.viewport_origin.x) * self.display_factor(),
            y: (map_px.y - self.viewport_origin.y) * self.display_factor(),
        }
    }

    /// Map pixels → map meters. The y axis flips: pixels grow down, meters
    /// grow north.
    #[must_use]
    pub fn map_px_to_meters(&self, map_px: Point) -> Point {
        Point {
            x: map_px.x / self.map_scale() + self.origin_m.x,
            y: -map_px.y / self.map_scale() + self.origin_m.y,
        }
    }

    /// Map meters → map pixels.
    #[must_use]
    pub fn meters_to_map_px(&self, m: Point) -> Point {
        Point {
            x: (m.x - self.origin_m.x) * self.map_scale(),
            y: -(m.y - self.origin_m.y) * self.map_scale(),
        }
    }

    /// Viewport pixels → map meters.
    #[must_use]
    pub fn viewport_to_meters(&self, vp: Point) -> Point {
        self.map_px_to_meters(self.viewport_to_map_px(vp))
    }

    /// Map meters → viewport pixels.
    #[must_use]
    pub fn meters_to_viewport(&self, m: Point) -> Point {
        self.map_px_to_viewport(self.meters_to_map_px(m))
    }

    // ── Pan / zoom ──────────────────────────────────────────────

    /// Change zoom by `notches` wheel steps, keeping the map point under
    /// `anchor_vp` fixed on screen. Positive notches zoom in.
    pub fn zoom_at(&mut self, anchor_vp: Point, notches: f64) {
        let anchor_map_px = self.viewport_to_map_px(anchor_vp);

        self.zoom = (self.zoom + notches * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);

        self.viewport_origin = Point {
            x: anchor_map_px.x - anchor_vp.x / self.display_factor(),
            y: anchor_map_px.y - anchor_vp.y / self.display_factor(),
        };
        if self.zoom <= ZOOM_MIN {
            self.viewport_origin = Point::new(0.0, 0.0);
        }
        self.clamp_origin();
    }

    /// Shift the pan origin by a map-pixel delta (positive delta drags the
    /// map content toward positive viewport x/y).
    pub fn pan_by(&mut self, delta_map_px: Point) {
        self.viewport_origin.x -= delta_map_px.x;
        self.viewport_origin.y -= delta_map_px.y;
        self.clamp_origin();
    }

    /// Reset to zoom 1 with the origin at the top-left corner.
    pub fn clear_zoom(&mut self) {
        self.zoom = ZOOM_MIN;
        self.viewport_origin = Point::new(0.0, 0.0);
    }

    /// Keep the origin non-negative, and pinned to zero on any axis where
    /// the scaled map already fits inside the viewport.
    pub fn clamp_origin(&mut self) {
        self.viewport_origin.x = self.viewport_origin.x.max(0.0);
        self.viewport_origin.y = self.viewport_origin.y.max(0.0);

        if self.image_width_px * self.display_factor() <= self.viewport_width_px {
            self.viewport_origin.x = 0.0;
        }
        if self.image_height_px * self.display_factor() <= self.viewport_height_px {
            self.viewport_origin.y = 0.0;
        }
    }
}
