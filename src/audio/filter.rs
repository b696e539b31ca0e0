use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Lowpass,
    Bandpass,
}

/// RBJ biquad. Coefficients are fixed at construction; a voice builds its
/// filters once per hit and only runs `process` in the callback.
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    // passthrough
    fn default() -> Self {
        Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0, x1: 0.0, x2: 0.0, y1: 0.0, y2: 0.0 }
    }
}

impl Biquad {
    pub fn new(shape: Shape, sample_rate: f32, hz: f32, q: f32) -> Self {
        // keep the corner below nyquist or the coefficients blow up
        let w0 = 2.0 * PI * (hz / sample_rate).clamp(0.0001, 0.49);
        let alpha = w0.sin() / (2.0 * q.max(0.01));
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match shape {
            Shape::Lowpass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
            Shape::Bandpass => (alpha, 0.0, -alpha),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
            ..Self::default()
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn generate_sine_wave(frequency: f32, duration_samples: usize) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn calculate_rms(samples: &[f32]) -> f32 {
        let sum_squares: f32 = samples.iter().map(|x| x * x).sum();
        (sum_squares / samples.len() as f32).sqrt()
    }

    // steady-state gain in dB, skipping the filter's warmup
    fn attenuation_db(shape: Shape, cutoff: f32, q: f32, frequency: f32) -> f32 {
        let input = generate_sine_wave(frequency, 4410);
        let mut filter = Biquad::new(shape, SAMPLE_RATE, cutoff, q);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        20.0 * (calculate_rms(&output[1000..]) / calculate_rms(&input[1000..])).log10()
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        assert!(attenuation_db(Shape::Lowpass, 1000.0, 0.707, 200.0) > -6.0);
        assert!(attenuation_db(Shape::Lowpass, 1000.0, 0.707, 5000.0) < -20.0);
    }

    #[test]
    fn bandpass_keeps_the_center() {
        // the clap's band
        assert!(attenuation_db(Shape::Bandpass, 1000.0, 1.5, 1000.0) > -3.0);
        assert!(attenuation_db(Shape::Bandpass, 1000.0, 1.5, 100.0) < -12.0);
        assert!(attenuation_db(Shape::Bandpass, 1000.0, 1.5, 10000.0) < -12.0);
    }

    #[test]
    fn corner_above_nyquist_stays_finite() {
        let mut filter = Biquad::new(Shape::Lowpass, SAMPLE_RATE, 40000.0, 0.7);
        for s in generate_sine_wave(3000.0, 2000) {
            assert!(filter.process(s).is_finite());
        }
    }
}
