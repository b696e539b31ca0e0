// Musical parameters derived from a sampled line. Everything here is a pure
// function of the line; the randomness starts in the policy.

use super::raster::{ColumnExtent, SampledLine};
use crate::shared::{CANVAS_HEIGHT, LOOP_SECONDS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tempo {
    pub bpm: u32,
}

impl Tempo {
    // bpm = 100 + floor(profile[0] * 100). A profile can't actually reach 1.0
    // (the lowest ink row is 399/400), but if it does we get 200, not 199.
    pub fn from_line(line: &SampledLine) -> Self {
        let first = line.profile.get(0).unwrap_or(0.5);
        Self { bpm: 100 + (first * 100.0).floor() as u32 }
    }

    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    // whole beats that fit in the loop; a trailing partial beat is dropped
    pub fn slot_count(&self) -> usize {
        (LOOP_SECONDS * self.bpm / 60) as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotParameters {
    pub intensity: f64, // normalized, -1..1
    pub range: f64, // vertical spread of the ink, 0..1
    pub position: f64, // mean height of the ink, 0 = top
}

impl SlotParameters {
    pub fn derive(line: &SampledLine, slot: usize, slot_count: usize) -> Self {
        let height = CANVAS_HEIGHT as f64;
        let index = waveform_index(slot, slot_count, line.profile.len());

        let raw = line.profile.get(index).unwrap_or(0.0);
        let extent = line.extents.get(index).copied().unwrap_or(ColumnExtent {
            min_y: 0.0,
            max_y: height,
            avg_y: height / 2.0,
        });

        Self {
            intensity: (raw - 0.5) * 2.0,
            range: (extent.max_y - extent.min_y) / height,
            position: extent.avg_y / height,
        }
    }
}

fn waveform_index(slot: usize, slot_count: usize, profile_len: usize) -> usize {
    if slot_count == 0 {
        return 0;
    }
    ((slot as f64 / slot_count as f64) * profile_len as f64).floor() as usize
}

/// Tempo plus the parameters of every slot in the loop, in order.
pub fn derive_slots(line: &SampledLine) -> (Tempo, Vec<SlotParameters>) {
    let tempo = Tempo::from_line(line);
    let count = tempo.slot_count();
    let slots = (0..count)
        .map(|i| SlotParameters::derive(line, i, count))
        .collect();
    (tempo, slots)
}
