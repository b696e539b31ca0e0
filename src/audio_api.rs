// What the core is allowed to ask of the synthesis backend: "play this
// instrument at this time with these numbers". Everything else about how the
// sound is made lives behind the engine.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instrument {
    Kick,
    Snare,
    HiHat,
    Tom,
    Clap,
    Bass,
}

impl Instrument {
    pub fn label(self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::HiHat => "hihat",
            Instrument::Tom => "tom",
            Instrument::Clap => "clap",
            Instrument::Bass => "bass",
        }
    }
}

/// Synthesis parameters for one hit. Frequencies in Hz, times in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
    Kick { frequency: f32, decay: f32 },
    Snare { frequency: f32, decay: f32 },
    HiHat { frequency: f32, decay: f32 },
    Tom { frequency: f32, decay: f32 },
    Clap { decay: f32 },
    Bass { frequency: f32, duration: f32 },
}

impl Hit {
    pub fn instrument(&self) -> Instrument {
        match self {
            Hit::Kick { .. } => Instrument::Kick,
            Hit::Snare { .. } => Instrument::Snare,
            Hit::HiHat { .. } => Instrument::HiHat,
            Hit::Tom { .. } => Instrument::Tom,
            Hit::Clap { .. } => Instrument::Clap,
            Hit::Bass { .. } => Instrument::Bass,
        }
    }

    /// Backend-side sanity clamps. Non-finite values fall back to the
    /// instrument's default before the bounds are applied, so nothing NaN,
    /// negative or runaway reaches an oscillator.
    pub fn sanitized(self) -> Self {
        match self {
            Hit::Kick { frequency, decay } => Hit::Kick {
                frequency: finite_or(frequency, 50.0).max(1.0),
                decay: finite_or(decay, 0.5).max(0.01),
            },
            Hit::Snare { frequency, decay } => Hit::Snare {
                frequency: finite_or(frequency, 200.0).clamp(100.0, 500.0),
                decay: finite_or(decay, 0.2).clamp(0.05, 0.5),
            },
            Hit::HiHat { frequency, decay } => Hit::HiHat {
                frequency: finite_or(frequency, 6000.0).clamp(3000.0, 8000.0),
                decay: finite_or(decay, 0.08).max(0.05),
            },
            Hit::Tom { frequency, decay } => Hit::Tom {
                frequency: finite_or(frequency, 100.0).clamp(20.0, 2000.0),
                decay: finite_or(decay, 0.3).clamp(0.01, 2.0),
            },
            Hit::Clap { decay } => Hit::Clap {
                decay: finite_or(decay, 0.3).clamp(0.01, 2.0),
            },
            Hit::Bass { frequency, duration } => Hit::Bass {
                frequency: finite_or(frequency, 40.0).clamp(20.0, 200.0),
                duration: finite_or(duration, 0.2).clamp(0.1, 2.0),
            },
        }
    }

    /// How long the hit sounds, i.e. when the backend stops it.
    pub fn length_seconds(&self) -> f32 {
        match *self {
            Hit::Kick { decay, .. }
            | Hit::Snare { decay, .. }
            | Hit::HiHat { decay, .. }
            | Hit::Tom { decay, .. }
            | Hit::Clap { decay } => decay,
            Hit::Bass { duration, .. } => duration,
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // Fire-and-forget: the engine starts the hit once its clock reaches
    // `at_sample`. There's no way to take one back.
    Schedule { at_sample: u64, hit: Hit },

    // Drops every hit that hasn't started yet. Only sent when the engine is
    // being closed; hits already sounding ring out.
    DropPending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Suspended, // stream exists but isn't pulling audio
    Closed, // gone for good, needs a fresh connect
}

/// The slice of a real-time audio engine the transport uses: a clock, a
/// queue for future hits, and lifecycle.
pub trait AudioEngine {
    /// Seconds on the engine's own clock.
    fn now(&self) -> f64;
    fn state(&self) -> EngineState;
    fn resume(&mut self) -> anyhow::Result<()>;
    fn submit(&mut self, at: f64, hit: Hit) -> anyhow::Result<()>;
    fn close(&mut self);
}

/// Creates engines. Called lazily, and again whenever the previous engine
/// is closed or failed to come up.
pub trait EngineConnector {
    fn connect(&mut self) -> anyhow::Result<Box<dyn AudioEngine>>;
}
