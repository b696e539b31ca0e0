use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::effect::{Effect, EffectSpec};
use super::frame::StereoFrame;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, Hit};

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
// a loop is at most 33 slots x 11 hits (six hi-hat subdivisions); room for
// two so a restart right after a clear doesn't crowd out the new loop
const MAX_HITS_PER_LOOP: usize = 33 * 11;
const MAX_PENDING: usize = (2 * MAX_HITS_PER_LOOP).next_power_of_two();

#[derive(Clone, Copy, Debug)]
struct Pending {
    at_sample: u64,
    seq: u64, // keeps submission order for hits on the same sample
    hit: Hit,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // reversed: BinaryHeap is a max-heap, we want the earliest hit on top
    fn cmp(&self, other: &Self) -> Ordering {
        (other.at_sample, other.seq).cmp(&(self.at_sample, self.seq))
    }
}

pub struct Engine {
    position: u64, // frames rendered since the stream started
    pending: BinaryHeap<Pending>,
    voices: Vec<Voice>, // fixed pool of voices
    master: Vec<Box<dyn Effect>>,
    seq: u64,
}

impl Engine {
    pub fn new(sample_rate: u32, master: &[EffectSpec]) -> Self {
        let sr = sample_rate as f32;
        Self {
            position: 0,
            pending: BinaryHeap::with_capacity(MAX_PENDING),
            voices: vec![Voice::idle(sr); MAX_VOICES],
            master: master.iter().map(EffectSpec::to_effect).collect(),
            seq: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Schedule { at_sample, hit } => {
                // past capacity the hit is dropped rather than growing the heap
                if self.pending.len() < MAX_PENDING {
                    self.seq += 1;
                    self.pending.push(Pending { at_sample, seq: self.seq, hit });
                }
            }
            AudioCommand::DropPending => self.pending.clear(),
        }
    }

    fn trigger_voice(&mut self, hit: Hit, seed: u64) {
        // what slot do we write to? a free one, else steal the oldest
        let slot = self
            .voices
            .iter()
            .position(|v| !v.active)
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, v)| v.age)
                    .map(|(i, _)| i)
            })
            .unwrap_or(0);
        self.voices[slot].start(hit, seed);
    }

    pub fn next_sample(&mut self) -> f32 {
        // late hits (scheduled for a sample already rendered) start right away
        while let Some(next) = self.pending.peek().copied() {
            if next.at_sample > self.position {
                break;
            }
            self.pending.pop();
            self.trigger_voice(next.hit, next.seq);
        }

        let mut out = 0.0f32;
        for v in &mut self.voices {
            out += v.next_sample();
        }
        self.position += 1;
        out
    }

    pub fn render_block(&mut self, frames: &mut [StereoFrame]) {
        for frame in frames.iter_mut() {
            *frame = StereoFrame::mono(self.next_sample());
        }
        for fx in self.master.iter_mut() {
            fx.process(frames);
        }
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }
}
