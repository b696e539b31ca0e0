use super::frame::StereoFrame;

// Master bus processing. Every hit in a slot lands on the same sample, so a
// loud slot can stack five or six voices; this keeps the sum in range.
#[derive(Clone, Debug)]
pub enum EffectSpec {
    Gain { level: f32 },
    SoftClip { drive: f32 },
}

impl EffectSpec {
    pub fn to_effect(&self) -> Box<dyn Effect> {
        match self {
            EffectSpec::Gain { level } => Box::new(Gain::new(*level)),
            EffectSpec::SoftClip { drive } => Box::new(SoftClip::new(*drive)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            EffectSpec::Gain { level } => format!("Gain({})", level),
            EffectSpec::SoftClip { drive } => format!("SoftClip({})", drive),
        }
    }
}

pub fn master_chain(level: f32) -> Vec<EffectSpec> {
    vec![EffectSpec::Gain { level }, EffectSpec::SoftClip { drive: 0.1 }]
}

pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

//gain
pub struct Gain {
    level: f32,
}

impl Gain {
    pub fn new(level: f32) -> Self {
        Self {
            level: if level.is_finite() { level.clamp(0.0, 1.0) } else { 1.0 },
        }
    }
}

impl Effect for Gain {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            f.left *= self.level;
            f.right *= self.level;
        }
    }
}

//soft clip
pub struct SoftClip {
    drive: f32,
}

impl SoftClip {
    pub fn new(drive: f32) -> Self {
        Self {
            drive: drive.clamp(0.0, 1.0),
        }
    }
}

impl Effect for SoftClip {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let pre_gain = 1.0 + self.drive * 10.0;
        let norm = pre_gain.tanh(); // so full scale in stays full scale out
        for f in buf.iter_mut() {
            f.left = ((pre_gain * f.left).tanh() / norm).clamp(-1.0, 1.0);
            f.right = ((pre_gain * f.right).tanh() / norm).clamp(-1.0, 1.0);
        }
    }
}
