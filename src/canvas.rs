// The drawing surface. Strokes are stamped straight into an RGBA raster the
// same size and colors as the sampler expects, so the core never sees
// anything but pixels.

use crate::beat::raster::Raster;
use crate::shared::{MAX_THICKNESS, MIN_THICKNESS};

pub const BACKGROUND: [u8; 4] = [0x00, 0x11, 0x00, 0xFF]; // #001100
pub const INK: [u8; 4] = [0x00, 0xFF, 0x00, 0xFF]; // #00FF00

// distance between stamped discs along a segment, in pixels
const STAMP_STEP: f64 = 0.5;

pub struct Canvas {
    raster: Raster,
    thickness: u32,
    pen: Option<(f64, f64)>, // last point of the stroke in progress
    points: Vec<(f64, f64)>, // stroke centerline, for the display
}

impl Canvas {
    pub fn new(thickness: u32) -> Self {
        Self {
            raster: Raster::filled(BACKGROUND),
            thickness: thickness.clamp(MIN_THICKNESS, MAX_THICKNESS),
            pen: None,
            points: Vec::new(),
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn thickness(&self) -> u32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: u32) {
        self.thickness = thickness.clamp(MIN_THICKNESS, MAX_THICKNESS);
    }

    pub fn ink_points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Extends the current stroke to `(x, y)`, or starts one there.
    pub fn draw_to(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        match self.pen {
            Some(from) => self.stamp_segment(from, (x, y)),
            None => self.stamp(x, y),
        }
        self.pen = Some((x, y));
    }

    /// Ends the stroke. Returns whether there was one.
    pub fn pen_up(&mut self) -> bool {
        self.pen.take().is_some()
    }

    pub fn clear(&mut self) {
        self.raster.fill(BACKGROUND);
        self.pen = None;
        self.points.clear();
    }

    fn stamp_segment(&mut self, from: (f64, f64), to: (f64, f64)) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = ((dx.hypot(dy) / STAMP_STEP).ceil() as usize).max(1);
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            self.stamp(from.0 + dx * t, from.1 + dy * t);
        }
    }

    // one round-capped disc of the current thickness
    fn stamp(&mut self, x: f64, y: f64) {
        let radius = (self.thickness as f64 / 2.0).max(0.5);
        let reach = radius.ceil() as i64;
        let (cx, cy) = (x.round() as i64, y.round() as i64);

        for py in (cy - reach)..=(cy + reach) {
            for px in (cx - reach)..=(cx + reach) {
                if px < 0 || py < 0 {
                    continue;
                }
                let dist = (px as f64 - x).hypot(py as f64 - y);
                if dist <= radius {
                    self.raster.set_pixel(px as usize, py as usize, INK);
                }
            }
        }
        self.points.push((x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::raster::{self, is_ink};
    use crate::shared::{CANVAS_HEIGHT, CANVAS_WIDTH};

    fn inked(canvas: &Canvas) -> usize {
        let mut n = 0;
        for y in 0..CANVAS_HEIGHT {
            for x in 0..CANVAS_WIDTH {
                if is_ink(canvas.raster().pixel(x, y)) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn colors_match_the_sampler() {
        assert!(is_ink(INK));
        assert!(!is_ink(BACKGROUND));
    }

    #[test]
    fn thinnest_dot_is_one_pixel() {
        let mut canvas = Canvas::new(1);
        canvas.draw_to(10.0, 20.0);
        assert_eq!(inked(&canvas), 1);
        assert!(is_ink(canvas.raster().pixel(10, 20)));
    }

    #[test]
    fn thick_dot_is_round() {
        let mut canvas = Canvas::new(10);
        canvas.draw_to(100.0, 100.0);
        assert!(is_ink(canvas.raster().pixel(105, 100)));
        assert!(is_ink(canvas.raster().pixel(100, 95)));
        // corner of the bounding box stays background
        assert!(!is_ink(canvas.raster().pixel(105, 105)));
    }

    #[test]
    fn stroke_covers_every_column_it_crosses() {
        let mut canvas = Canvas::new(2);
        canvas.draw_to(0.0, 50.0);
        canvas.draw_to(799.0, 350.0);
        assert!(canvas.pen_up());

        let line = raster::sample(canvas.raster());
        assert!(!line.is_empty_drawing());
        assert!(line.extents.iter().all(|e| e.max_y > 0.0));
        // starts high on the canvas, ends low
        assert!(line.profile.get(0).unwrap() < 0.2);
        assert!(line.profile.get(799).unwrap() > 0.8);
    }

    #[test]
    fn separate_strokes_are_not_joined() {
        let mut canvas = Canvas::new(1);
        canvas.draw_to(10.0, 10.0);
        canvas.pen_up();
        canvas.draw_to(30.0, 10.0);
        assert!(!is_ink(canvas.raster().pixel(20, 10)));
        assert!(canvas.pen_up());
    }

    #[test]
    fn off_canvas_points_are_clipped() {
        let mut canvas = Canvas::new(6);
        canvas.draw_to(-2.0, 399.0);
        canvas.draw_to(f64::NAN, 5.0);
        assert!(is_ink(canvas.raster().pixel(0, 399)));
        assert_eq!(canvas.ink_points().len(), 1);
    }

    #[test]
    fn clear_restores_background() {
        let mut canvas = Canvas::new(4);
        canvas.draw_to(10.0, 10.0);
        canvas.draw_to(50.0, 60.0);
        canvas.clear();
        assert_eq!(inked(&canvas), 0);
        assert!(canvas.ink_points().is_empty());
        assert!(!canvas.pen_up());
        assert!(raster::sample(canvas.raster()).is_empty_drawing());
    }

    #[test]
    fn thickness_is_clamped() {
        let mut canvas = Canvas::new(0);
        assert_eq!(canvas.thickness(), MIN_THICKNESS);
        canvas.set_thickness(99);
        assert_eq!(canvas.thickness(), MAX_THICKNESS);
    }
}
