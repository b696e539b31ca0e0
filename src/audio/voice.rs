use std::f32::consts::TAU;

use super::filter::{Biquad, Shape};
use crate::audio_api::Hit;

// snare and clap read from a fixed 0.2s noise burst, whatever the decay
const NOISE_BURST_SECONDS: f32 = 0.2;

/// Exponential ramp from `from` to `to` over `over` seconds, held at `to`
/// afterwards. Both ends must be positive.
#[inline]
fn ramp(from: f32, to: f32, t: f32, over: f32) -> f32 {
    if t >= over {
        return to;
    }
    from * (to / from).powf(t / over)
}

#[inline]
fn triangle(phase: f32) -> f32 {
    // phase in 0..1: 0 at the start, +1 at a quarter, -1 at three quarters
    let q = (phase + 0.25).fract();
    1.0 - 4.0 * (q - 0.5).abs()
}

/// One sounding hit. Voices live in a fixed pool and are reused; `start`
/// resets everything the previous hit left behind.
#[derive(Clone, Debug)]
pub struct Voice {
    hit: Hit,
    pub active: bool,
    pub age: u32, // samples since start
    length: u32,
    sample_rate: f32,
    phase: f32, // 0..1
    noise: fastrand::Rng,
    band: Biquad,
    low: Biquad,
}

impl Voice {
    pub fn idle(sample_rate: f32) -> Self {
        Self {
            hit: Hit::Clap { decay: 0.0 },
            active: false,
            age: 0,
            length: 0,
            sample_rate,
            phase: 0.0,
            noise: fastrand::Rng::with_seed(0),
            band: Biquad::default(),
            low: Biquad::default(),
        }
    }

    pub fn start(&mut self, hit: Hit, seed: u64) {
        let hit = hit.sanitized();
        let sr = self.sample_rate;
        let (band, low) = match hit {
            Hit::HiHat { frequency, .. } => (
                Biquad::new(Shape::Bandpass, sr, frequency, 0.7),
                Biquad::new(Shape::Lowpass, sr, frequency * 1.5, 0.707),
            ),
            Hit::Clap { .. } => (Biquad::new(Shape::Bandpass, sr, 1000.0, 1.5), Biquad::default()),
            _ => (Biquad::default(), Biquad::default()),
        };

        self.hit = hit;
        self.active = true;
        self.age = 0;
        self.length = (hit.length_seconds() * sr).round().max(1.0) as u32;
        self.phase = 0.0;
        self.noise.seed(seed);
        self.band = band;
        self.low = low;
    }

    fn advance(&mut self, frequency: f32) {
        self.phase += frequency / self.sample_rate;
        self.phase -= self.phase.floor();
    }

    fn white(&mut self) -> f32 {
        self.noise.f32() * 2.0 - 1.0
    }

    fn burst(&mut self, t: f32) -> f32 {
        if t < NOISE_BURST_SECONDS { self.white() } else { 0.0 }
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let t = self.age as f32 / self.sample_rate;

        let out = match self.hit {
            Hit::Kick { frequency, decay } => {
                let s = (self.phase * TAU).sin() * ramp(0.8, 0.001, t, decay);
                self.advance(ramp(frequency, (frequency * 0.01).max(1.0), t, decay));
                s
            }
            Hit::Snare { frequency, decay } => {
                let noise = self.burst(t) * ramp(0.8, 0.01, t, decay);
                let body = (self.phase * TAU).sin() * ramp(0.6, 0.01, t, decay * 0.5);
                self.advance(frequency);
                noise + body
            }
            Hit::HiHat { decay, .. } => {
                let n = self.white();
                let filtered = self.low.process(self.band.process(n));
                filtered * ramp(0.5, 0.01, t, decay)
            }
            Hit::Tom { frequency, decay } => {
                let s = (self.phase * TAU).sin() * ramp(0.6, 0.01, t, decay);
                self.advance(ramp(frequency, frequency * 0.5, t, decay));
                s
            }
            Hit::Clap { decay } => {
                let n = self.burst(t);
                self.band.process(n) * ramp(0.8, 0.01, t, decay)
            }
            Hit::Bass { frequency, duration } => {
                let s = triangle(self.phase) * ramp(0.6, 0.001, t, duration);
                self.advance(frequency);
                s
            }
        };

        self.age += 1;
        if self.age >= self.length {
            self.active = false;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn render(hit: Hit) -> Vec<f32> {
        let mut voice = Voice::idle(SR);
        voice.start(hit, 7);
        let mut out = Vec::new();
        while voice.active {
            out.push(voice.next_sample());
        }
        out
    }

    #[test]
    fn ramp_hits_both_ends() {
        assert_eq!(ramp(0.8, 0.001, 0.0, 0.5), 0.8);
        assert!((ramp(0.8, 0.001, 0.5, 0.5) - 0.001).abs() < 1e-7);
        assert!((ramp(1.0, 0.01, 0.25, 0.5) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn triangle_spans_unit_range() {
        assert!((triangle(0.25) - 1.0).abs() < 1e-6);
        assert!((triangle(0.75) + 1.0).abs() < 1e-6);
        assert!(triangle(0.0).abs() < 1e-6);
        assert!(triangle(0.5).abs() < 1e-6);
    }

    #[test]
    fn hit_stops_after_its_length() {
        let out = render(Hit::Kick { frequency: 60.0, decay: 0.25 });
        assert_eq!(out.len(), (0.25 * SR) as usize);

        let out = render(Hit::Bass { frequency: 40.0, duration: 0.5 });
        assert_eq!(out.len(), (0.5 * SR) as usize);
    }

    #[test]
    fn every_instrument_renders_bounded_audio() {
        let hits = [
            Hit::Kick { frequency: 80.0, decay: 0.3 },
            Hit::Snare { frequency: 200.0, decay: 0.2 },
            Hit::HiHat { frequency: 6000.0, decay: 0.08 },
            Hit::Tom { frequency: 150.0, decay: 0.3 },
            Hit::Clap { decay: 0.3 },
            Hit::Bass { frequency: 50.0, duration: 0.2 },
        ];
        for hit in hits {
            let out = render(hit);
            assert!(!out.is_empty());
            assert!(out.iter().all(|s| s.is_finite() && s.abs() < 2.0), "{hit:?}");
            assert!(out.iter().any(|s| s.abs() > 0.01), "{hit:?} is silent");
        }
    }

    #[test]
    fn noise_burst_is_cut_after_two_tenths() {
        // clap's decay outlasts the burst; the tail is only filter ringdown
        let out = render(Hit::Clap { decay: 1.0 });
        let tail = &out[(0.3 * SR) as usize..];
        assert!(tail.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn restarting_a_voice_forgets_the_old_hit() {
        let mut voice = Voice::idle(SR);
        voice.start(Hit::Bass { frequency: 100.0, duration: 1.0 }, 1);
        for _ in 0..1000 {
            voice.next_sample();
        }
        voice.start(Hit::Kick { frequency: 50.0, decay: 0.1 }, 2);
        assert_eq!(voice.age, 0);
        assert_eq!(voice.next_sample(), 0.0); // sine starts at phase 0
    }
}
