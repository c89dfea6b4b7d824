// SPDX: CC0-1.0

// screen y grows downward, world y upward

use crate::{Number, Point, ViewRect, Viewport};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("zoom factor must be finite and greater than zero, got {0}")]
    BadFactor(Number),

    #[error("screen offsets must be finite, got ({x}, {y})")]
    NotFinite { x: Number, y: Number },

    #[error("view bounds must be finite with min < max on both axes")]
    BadBounds,

    #[error("view cannot be scaled any further")]
    Degenerate,
}

/// The visible rectangle together with the viewport it is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    rect: ViewRect,
    viewport: Viewport,
}

impl ViewTransform {
    pub const fn new(rect: ViewRect, viewport: Viewport) -> Self {
        Self { rect, viewport }
    }

    pub const fn rect(&self) -> ViewRect {
        self.rect
    }

    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn world_to_screen(&self, p: Point<Number>) -> Point<Number> {
        let r = &self.rect;
        Point {
            x: (p.x - r.x_min()) / r.x_range() * self.viewport.width(),
            y: self.viewport.height() - (p.y - r.y_min()) / r.y_range() * self.viewport.height(),
        }
    }

    pub fn screen_to_world(&self, s: Point<Number>) -> Point<Number> {
        let r = &self.rect;
        Point {
            x: r.x_min() + s.x / self.viewport.width() * r.x_range(),
            y: r.y_max() - s.y / self.viewport.height() * r.y_range(),
        }
    }

    pub fn set_view(&mut self, rect: ViewRect) {
        self.rect = rect;
    }

    /// Move the view so the plotted content follows a drag of
    /// `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: Number, dy: Number) -> Result<(), ViewError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ViewError::NotFinite { x: dx, y: dy });
        }
        let r = self.rect;
        let wx = dx * r.x_range() / self.viewport.width();
        let wy = -dy * r.y_range() / self.viewport.height();
        self.rect = ViewRect::new(
            r.x_min() - wx,
            r.x_max() - wx,
            r.y_min() - wy,
            r.y_max() - wy,
        )
        .ok_or(ViewError::Degenerate)?;
        tracing::debug!(dx, dy, view = %self.rect, "panned");
        Ok(())
    }

    /// Scale both axis ranges by `factor` about the world point under the
    /// screen point `focal`, which stays under `focal` afterwards. A factor
    /// above one zooms out.
    pub fn zoom(&mut self, factor: Number, focal: Point<Number>) -> Result<(), ViewError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ViewError::BadFactor(factor));
        }
        if !focal.x.is_finite() || !focal.y.is_finite() {
            return Err(ViewError::NotFinite {
                x: focal.x,
                y: focal.y,
            });
        }
        let c = self.screen_to_world(focal);
        let r = self.rect;
        self.rect = ViewRect::new(
            c.x - (c.x - r.x_min()) * factor,
            c.x + (r.x_max() - c.x) * factor,
            c.y - (c.y - r.y_min()) * factor,
            c.y + (r.y_max() - c.y) * factor,
        )
        .ok_or(ViewError::Degenerate)?;
        tracing::debug!(factor, view = %self.rect, "zoomed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> ViewTransform {
        ViewTransform::new(
            ViewRect::new(-10.0, 10.0, -5.0, 15.0).unwrap(),
            Viewport::new(800, 400).unwrap(),
        )
    }

    fn close(a: Point<Number>, b: Point<Number>) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn maps_corners_with_flipped_y() {
        let t = transform();
        assert_eq!(t.world_to_screen(Point::new(-10.0, -5.0)), Point::new(0.0, 400.0));
        assert_eq!(t.world_to_screen(Point::new(10.0, 15.0)), Point::new(800.0, 0.0));
        assert_eq!(t.world_to_screen(Point::new(0.0, 5.0)), Point::new(400.0, 200.0));
    }

    #[test]
    fn mappings_are_inverse() {
        let t = transform();
        for p in [
            Point::new(-9.5, -4.0),
            Point::new(0.1, 0.2),
            Point::new(3.3, 14.9),
            Point::new(7.25, 1e-3),
        ] {
            assert!(close(t.screen_to_world(t.world_to_screen(p)), p));
        }
        let s = Point::new(123.0, 321.0);
        assert!(close(t.world_to_screen(t.screen_to_world(s)), s));
    }

    #[test]
    fn zoom_keeps_focal_point() {
        for (factor, focal) in [
            (0.9, Point::new(100.0, 50.0)),
            (1.1, Point::new(700.0, 390.0)),
            (0.5, Point::new(400.0, 200.0)),
            (3.0, Point::new(0.0, 0.0)),
        ] {
            let mut t = transform();
            let before = t.screen_to_world(focal);
            t.zoom(factor, focal).unwrap();
            assert!(close(t.screen_to_world(focal), before));
            assert!((t.rect().x_range() - 20.0 * factor).abs() < 1e-9);
            assert!((t.rect().y_range() - 20.0 * factor).abs() < 1e-9);
        }
    }

    #[test]
    fn zoom_rejects_bad_factors() {
        let mut t = transform();
        let focal = Point::new(1.0, 1.0);
        for factor in [0.0, -1.0, Number::NAN, Number::INFINITY] {
            assert!(t.zoom(factor, focal).is_err());
        }
        assert_eq!(t, transform());
    }

    #[test]
    fn zoom_refuses_to_collapse_the_view() {
        let mut t = transform();
        assert_eq!(
            t.zoom(1e-320, Point::new(400.0, 200.0)),
            Err(ViewError::Degenerate)
        );
        assert_eq!(t, transform());
    }

    #[test]
    fn pan_moves_content_with_the_drag() {
        let mut t = transform();
        // one world unit is 40 px across and 20 px down
        t.pan(40.0, 20.0).unwrap();
        let r = t.rect();
        assert_eq!((r.x_min(), r.x_max()), (-11.0, 9.0));
        assert_eq!((r.y_min(), r.y_max()), (-4.0, 16.0));
        assert!(t.pan(Number::NAN, 0.0).is_err());
    }
}
