// Raster sampling: a drawn RGBA image becomes one intensity value per column
// plus the vertical extent of the ink in that column.

use crate::shared::{CANVAS_HEIGHT, CANVAS_WIDTH, PROFILE_LEN};

/// An 8-bit RGBA image, row-major, always CANVAS_WIDTH x CANVAS_HEIGHT.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    data: Vec<u8>,
}

impl Raster {
    pub fn filled(rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(CANVAS_WIDTH * CANVAS_HEIGHT * 4);
        for _ in 0..CANVAS_WIDTH * CANVAS_HEIGHT {
            data.extend_from_slice(&rgba);
        }
        Self { data }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * CANVAS_WIDTH + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
            return;
        }
        let i = (y * CANVAS_WIDTH + x) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }
}

// bright green: high G, low R and B
#[inline]
pub fn is_ink(rgba: [u8; 4]) -> bool {
    rgba[1] > 200 && rgba[0] < 100 && rgba[2] < 100
}

/// Pixel-space bounds and mean of the ink in one column. With no ink all
/// three sit on the vertical midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnExtent {
    pub min_y: f64,
    pub max_y: f64,
    pub avg_y: f64,
}

impl ColumnExtent {
    pub fn empty() -> Self {
        let mid = CANVAS_HEIGHT as f64 / 2.0;
        Self { min_y: mid, max_y: mid, avg_y: mid }
    }
}

/// One value per canvas column in [0, 1]; 0.5 everywhere means nothing was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityProfile(Vec<f64>);

impl IntensityProfile {
    pub const EMPTY_VALUE: f64 = 0.5;

    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    // Exact comparison on purpose: a stroke whose mean lands precisely on the
    // midpoint in every column is indistinguishable from an empty canvas.
    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|&v| v == Self::EMPTY_VALUE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SampledLine {
    pub profile: IntensityProfile,
    pub extents: Vec<ColumnExtent>,
}

impl SampledLine {
    pub fn is_empty_drawing(&self) -> bool {
        self.profile.is_sentinel()
    }
}

pub fn sample(raster: &Raster) -> SampledLine {
    let height = CANVAS_HEIGHT as f64;
    let mut values = Vec::with_capacity(PROFILE_LEN);
    let mut extents = Vec::with_capacity(PROFILE_LEN);

    for x in 0..CANVAS_WIDTH {
        let mut count = 0usize;
        let mut sum = 0usize;
        let mut min_y = usize::MAX;
        let mut max_y = 0usize;
        for y in 0..CANVAS_HEIGHT {
            if is_ink(raster.pixel(x, y)) {
                count += 1;
                sum += y;
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        if count == 0 {
            values.push(IntensityProfile::EMPTY_VALUE);
            extents.push(ColumnExtent::empty());
            continue;
        }

        let avg_y = sum as f64 / count as f64;
        values.push(avg_y / height);
        extents.push(ColumnExtent {
            min_y: min_y as f64,
            max_y: max_y as f64,
            avg_y,
        });
    }

    SampledLine { profile: IntensityProfile::new(values), extents }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: [u8; 4] = [0x00, 0x11, 0x00, 0xff];
    const INK: [u8; 4] = [0x00, 0xff, 0x00, 0xff];

    #[test]
    fn blank_canvas_is_the_sentinel() {
        let line = sample(&Raster::filled(BG));
        assert_eq!(line.profile.len(), CANVAS_WIDTH);
        assert!(line.is_empty_drawing());
        assert!(line.extents.iter().all(|e| *e == ColumnExtent::empty()));
    }

    #[test]
    fn ink_predicate_thresholds() {
        assert!(is_ink([99, 201, 99, 255]));
        assert!(!is_ink([99, 200, 99, 255]));
        assert!(!is_ink([100, 255, 0, 255]));
        assert!(!is_ink([0, 255, 100, 255]));
    }

    #[test]
    fn column_extent_tracks_ink() {
        let mut raster = Raster::filled(BG);
        for y in [100, 110, 120] {
            raster.set_pixel(5, y, INK);
        }
        let line = sample(&raster);

        assert_eq!(line.profile.get(5), Some(110.0 / 400.0));
        assert_eq!(line.extents[5], ColumnExtent { min_y: 100.0, max_y: 120.0, avg_y: 110.0 });
        assert_eq!(line.profile.get(4), Some(0.5));
        assert!(!line.is_empty_drawing());
    }

    #[test]
    fn sampling_is_idempotent() {
        let mut raster = Raster::filled(BG);
        for x in 0..CANVAS_WIDTH {
            raster.set_pixel(x, (x * 7) % CANVAS_HEIGHT, INK);
        }
        assert_eq!(sample(&raster), sample(&raster));
    }

    #[test]
    fn midline_stroke_collides_with_sentinel() {
        let mut raster = Raster::filled(BG);
        for x in 0..CANVAS_WIDTH {
            raster.set_pixel(x, 200, INK);
        }
        let line = sample(&raster);
        assert!(line.is_empty_drawing());
        assert!(line.extents.iter().all(|e| e.min_y == 200.0 && e.max_y == 200.0));
    }

    #[test]
    fn rising_line_gives_falling_profile() {
        // bottom-left (y=399) to top-right (y=0)
        let mut raster = Raster::filled(BG);
        for x in 0..CANVAS_WIDTH {
            let y = 399 - (x * 399) / (CANVAS_WIDTH - 1);
            raster.set_pixel(x, y, INK);
        }
        let line = sample(&raster);
        let values = line.profile.as_slice();

        assert_eq!(values[0], 399.0 / 400.0);
        assert_eq!(values[CANVAS_WIDTH - 1], 0.0);
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
    }
}
