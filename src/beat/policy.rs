//! Voice trigger policy.
//!
//! Each instrument is one row in [`RULES`]: a trigger chance, a hit pattern
//! and linear parameter curves over the slot's derived features. A slot is
//! decided by walking the table in order and rolling one independent die per
//! instrument (or per subdivision for the hi-hat). Several instruments can
//! fire in the same slot.

use super::derive::SlotParameters;
use crate::audio_api::{Hit, Instrument};

/// Source of uniform draws in [0, 1).
pub trait Dice {
    fn roll(&mut self) -> f64;
}

impl Dice for fastrand::Rng {
    fn roll(&mut self) -> f64 {
        self.f64()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Feature {
    Intensity,
    InverseIntensity, // 1 - intensity
    Range,
    Position,
}

impl Feature {
    fn of(self, p: &SlotParameters) -> f64 {
        match self {
            Feature::Intensity => p.intensity,
            Feature::InverseIntensity => 1.0 - p.intensity,
            Feature::Range => p.range,
            Feature::Position => p.position,
        }
    }
}

/// `base + sum(weight * feature)`, optionally clamped.
#[derive(Clone, Copy, Debug)]
pub struct Curve {
    pub base: f64,
    pub terms: &'static [(Feature, f64)],
    pub clamp: Option<(f64, f64)>,
}

impl Curve {
    pub fn eval(&self, p: &SlotParameters) -> f64 {
        let raw = self
            .terms
            .iter()
            .fold(self.base, |acc, &(feature, weight)| acc + feature.of(p) * weight);
        match self.clamp {
            Some((lo, hi)) => raw.max(lo).min(hi),
            None => raw,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Chance {
    Curve(Curve),
    Fixed(f64),
    // curve * by
    Scaled { curve: Curve, by: Curve },
    // curve * (feature > threshold ? above : below)
    Gated { curve: Curve, feature: Feature, threshold: f64, above: f64, below: f64 },
}

impl Chance {
    // Not clamped: values <= 0 never fire, values >= 1 always fire.
    pub fn probability(&self, p: &SlotParameters) -> f64 {
        match self {
            Chance::Curve(c) => c.eval(p),
            Chance::Fixed(v) => *v,
            Chance::Scaled { curve, by } => curve.eval(p) * by.eval(p),
            Chance::Gated { curve, feature, threshold, above, below } => {
                let gate = if feature.of(p) > *threshold { *above } else { *below };
                curve.eval(p) * gate
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Pattern {
    Single,
    // base + floor(intensity * per_intensity) evenly spaced hits inside the slot
    Subdivided { base: i64, per_intensity: f64 },
}

impl Pattern {
    pub fn hits(&self, p: &SlotParameters) -> usize {
        match *self {
            Pattern::Single => 1,
            Pattern::Subdivided { base, per_intensity } => {
                (base + (p.intensity * per_intensity).floor() as i64).max(0) as usize
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VoiceRule {
    pub instrument: Instrument,
    pub chance: Chance,
    pub pattern: Pattern,
    pub frequency: Option<Curve>,
    pub decay: Curve, // duration for the bass
}

impl VoiceRule {
    pub fn hit(&self, p: &SlotParameters) -> Hit {
        let frequency = self.frequency.map_or(0.0, |c| c.eval(p)) as f32;
        let decay = self.decay.eval(p) as f32;
        match self.instrument {
            Instrument::Kick => Hit::Kick { frequency, decay },
            Instrument::Snare => Hit::Snare { frequency, decay },
            Instrument::HiHat => Hit::HiHat { frequency, decay },
            Instrument::Tom => Hit::Tom { frequency, decay },
            Instrument::Clap => Hit::Clap { decay },
            Instrument::Bass => Hit::Bass { frequency, duration: decay },
        }
    }
}

const fn curve(base: f64, terms: &'static [(Feature, f64)]) -> Curve {
    Curve { base, terms, clamp: None }
}

const fn clamped(base: f64, terms: &'static [(Feature, f64)], lo: f64, hi: f64) -> Curve {
    Curve { base, terms, clamp: Some((lo, hi)) }
}

use Feature::{Intensity, InverseIntensity, Position, Range};

pub const RULES: [VoiceRule; 6] = [
    VoiceRule {
        instrument: Instrument::Kick,
        chance: Chance::Curve(curve(0.0, &[(Intensity, 0.8)])),
        pattern: Pattern::Single,
        frequency: Some(clamped(30.0, &[(Intensity, 170.0)], 20.0, 200.0)),
        decay: clamped(0.05, &[(Intensity, 0.25)], 0.05, 0.3),
    },
    VoiceRule {
        instrument: Instrument::Snare,
        chance: Chance::Curve(curve(0.0, &[(InverseIntensity, 0.8)])),
        pattern: Pattern::Single,
        frequency: Some(clamped(100.0, &[(Intensity, 400.0)], 100.0, 500.0)),
        decay: clamped(0.05, &[(InverseIntensity, 0.25)], 0.05, 0.3),
    },
    VoiceRule {
        instrument: Instrument::HiHat,
        chance: Chance::Fixed(0.7),
        pattern: Pattern::Subdivided { base: 2, per_intensity: 4.0 },
        frequency: Some(curve(3000.0, &[(Intensity, 5000.0)])),
        decay: clamped(0.05, &[(Intensity, 0.05)], 0.05, 0.1),
    },
    VoiceRule {
        instrument: Instrument::Tom,
        chance: Chance::Scaled {
            curve: curve(0.0, &[(Range, 1.0)]),
            by: curve(1.0, &[(Intensity, 0.5)]),
        },
        pattern: Pattern::Single,
        frequency: Some(curve(80.0, &[(InverseIntensity, 220.0), (Range, 200.0)])),
        decay: curve(0.1, &[(Intensity, 0.2), (Position, 0.2)]),
    },
    VoiceRule {
        instrument: Instrument::Clap,
        chance: Chance::Gated {
            curve: curve(0.0, &[(Intensity, 0.5)]),
            feature: Position,
            threshold: 0.6,
            above: 0.8,
            below: 0.3,
        },
        pattern: Pattern::Single,
        frequency: None,
        decay: curve(0.2, &[(Intensity, 0.2), (Range, 0.2)]),
    },
    VoiceRule {
        instrument: Instrument::Bass,
        chance: Chance::Curve(curve(0.0, &[(InverseIntensity, 0.6)])),
        pattern: Pattern::Single,
        frequency: Some(clamped(20.0, &[(InverseIntensity, 180.0)], 20.0, 200.0)),
        decay: clamped(0.1, &[(Intensity, 0.9)], 0.1, 1.0),
    },
];

/// One die roll's outcome. `hit` is set only when the voice fired.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceTrigger {
    pub instrument: Instrument,
    pub time: f64,
    pub hit: Option<Hit>,
}

impl VoiceTrigger {
    pub fn fired(&self) -> bool {
        self.hit.is_some()
    }
}

/// Every trigger decision for one slot, in submission order.
pub fn decide_slot(
    params: &SlotParameters,
    slot_time: f64,
    beat_seconds: f64,
    dice: &mut impl Dice,
) -> Vec<VoiceTrigger> {
    let mut out = Vec::new();
    for rule in RULES.iter() {
        let probability = rule.chance.probability(params);
        let hits = rule.pattern.hits(params);
        let hit = rule.hit(params);
        for j in 0..hits {
            let time = match rule.pattern {
                Pattern::Single => slot_time,
                Pattern::Subdivided { .. } => slot_time + j as f64 * beat_seconds / hits as f64,
            };
            let fired = dice.roll() < probability;
            out.push(VoiceTrigger {
                instrument: rule.instrument,
                time,
                hit: fired.then_some(hit),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(instrument: Instrument) -> &'static VoiceRule {
        RULES.iter().find(|r| r.instrument == instrument).unwrap()
    }

    struct FixedDice(f64);

    impl Dice for FixedDice {
        fn roll(&mut self) -> f64 {
            self.0
        }
    }

    fn params(intensity: f64, range: f64, position: f64) -> SlotParameters {
        SlotParameters { intensity, range, position }
    }

    fn extremes() -> Vec<SlotParameters> {
        let mut out = Vec::new();
        for n in [-1.0, 0.0, 1.0] {
            for r in [0.0, 1.0] {
                for p in [0.0, 1.0] {
                    out.push(params(n, r, p));
                }
            }
        }
        out
    }

    #[test]
    fn clamped_curves_stay_in_bounds_at_extremes() {
        for p in extremes() {
            match rule(Instrument::Kick).hit(&p) {
                Hit::Kick { frequency, decay } => {
                    assert!((20.0..=200.0).contains(&frequency));
                    assert!((0.05..=0.3).contains(&decay));
                }
                other => panic!("unexpected {other:?}"),
            }
            match rule(Instrument::Snare).hit(&p) {
                Hit::Snare { frequency, decay } => {
                    assert!((100.0..=500.0).contains(&frequency));
                    assert!((0.05..=0.3).contains(&decay));
                }
                other => panic!("unexpected {other:?}"),
            }
            match rule(Instrument::HiHat).hit(&p) {
                Hit::HiHat { frequency, decay } => {
                    assert!((-2000.0..=8000.0).contains(&frequency));
                    assert!((0.05..=0.1).contains(&decay));
                }
                other => panic!("unexpected {other:?}"),
            }
            match rule(Instrument::Bass).hit(&p) {
                Hit::Bass { frequency, duration } => {
                    assert!((20.0..=200.0).contains(&frequency));
                    assert!((0.1..=1.0).contains(&duration));
                }
                other => panic!("unexpected {other:?}"),
            }
            // unclamped in the policy, bounded by the backend
            let tom = rule(Instrument::Tom).hit(&p).sanitized();
            let Hit::Tom { frequency, decay } = tom else { panic!() };
            assert!((20.0..=2000.0).contains(&frequency));
            assert!((0.01..=2.0).contains(&decay));
            let Hit::Clap { decay } = rule(Instrument::Clap).hit(&p).sanitized() else { panic!() };
            assert!((0.01..=2.0).contains(&decay));
        }
    }

    #[test]
    fn curve_values_match_formulas() {
        let p = params(0.5, 0.25, 0.75);
        assert_eq!(rule(Instrument::Kick).hit(&p), Hit::Kick { frequency: 115.0, decay: 0.175 });
        assert_eq!(rule(Instrument::Tom).hit(&p), Hit::Tom { frequency: 240.0, decay: 0.35 });
        assert_eq!(rule(Instrument::Clap).hit(&p), Hit::Clap { decay: 0.35 });
        assert_eq!(rule(Instrument::Bass).hit(&p), Hit::Bass { frequency: 110.0, duration: 0.55 });
    }

    #[test]
    fn probabilities_match_formulas() {
        let p = params(0.5, 0.4, 0.7);
        let prob = |i| rule(i).chance.probability(&p);
        assert!((prob(Instrument::Kick) - 0.4).abs() < 1e-12);
        assert!((prob(Instrument::Snare) - 0.4).abs() < 1e-12);
        assert!((prob(Instrument::HiHat) - 0.7).abs() < 1e-12);
        assert!((prob(Instrument::Tom) - 0.5).abs() < 1e-12);
        assert!((prob(Instrument::Clap) - 0.2).abs() < 1e-12);
        assert!((prob(Instrument::Bass) - 0.3).abs() < 1e-12);

        // low on the canvas: clap gate drops to 0.3
        let low = params(0.5, 0.4, 0.6);
        assert!((rule(Instrument::Clap).chance.probability(&low) - 0.075).abs() < 1e-12);
    }

    #[test]
    fn tom_chance_can_exceed_one_and_always_fires() {
        let p = params(1.0, 1.0, 0.5);
        assert!(rule(Instrument::Tom).chance.probability(&p) > 1.0);

        let triggers = decide_slot(&p, 0.0, 0.5, &mut FixedDice(0.999_999));
        let tom = triggers.iter().find(|t| t.instrument == Instrument::Tom).unwrap();
        assert!(tom.fired());
    }

    #[test]
    fn line_at_the_bottom_never_kicks_and_has_no_hats() {
        // intensity -1: negative kick chance, zero hi-hat subdivisions
        let p = params(-1.0, 0.0, 1.0);
        let triggers = decide_slot(&p, 2.0, 0.5, &mut FixedDice(0.0));

        assert!(triggers.iter().all(|t| t.instrument != Instrument::HiHat));
        let kick = triggers.iter().find(|t| t.instrument == Instrument::Kick).unwrap();
        assert!(!kick.fired());
        let snare = triggers.iter().find(|t| t.instrument == Instrument::Snare).unwrap();
        assert!(snare.fired());
        let tom = triggers.iter().find(|t| t.instrument == Instrument::Tom).unwrap();
        assert!(!tom.fired()); // zero range
    }

    #[test]
    fn hihat_subdivisions_are_evenly_spaced() {
        let p = params(1.0, 0.0, 0.5);
        let triggers = decide_slot(&p, 1.0, 0.6, &mut FixedDice(0.5));
        let times: Vec<f64> = triggers
            .iter()
            .filter(|t| t.instrument == Instrument::HiHat)
            .map(|t| t.time)
            .collect();

        assert_eq!(times.len(), 6);
        for (j, t) in times.iter().enumerate() {
            assert!((t - (1.0 + j as f64 * 0.1)).abs() < 1e-12);
        }
        assert_eq!(Pattern::Subdivided { base: 2, per_intensity: 4.0 }.hits(&params(-0.2, 0.0, 0.0)), 1);
        assert_eq!(Pattern::Subdivided { base: 2, per_intensity: 4.0 }.hits(&params(0.0, 0.0, 0.0)), 2);
    }

    #[test]
    fn triggers_come_out_in_instrument_order() {
        let p = params(0.2, 0.5, 0.5);
        let triggers = decide_slot(&p, 0.0, 0.5, &mut FixedDice(0.1));
        let order: Vec<Instrument> = triggers.iter().map(|t| t.instrument).collect();
        assert_eq!(
            order,
            vec![
                Instrument::Kick,
                Instrument::Snare,
                Instrument::HiHat,
                Instrument::HiHat,
                Instrument::Tom,
                Instrument::Clap,
                Instrument::Bass,
            ]
        );
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let p = params(0.3, 0.2, 0.4);
        let a = decide_slot(&p, 0.0, 0.5, &mut fastrand::Rng::with_seed(7));
        let b = decide_slot(&p, 0.0, 0.5, &mut fastrand::Rng::with_seed(7));
        assert_eq!(a, b);
    }
}
