use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::audio_api::{AudioCommand, AudioEngine, EngineConnector, EngineState, Hit};

mod effect;
mod engine;
mod filter;
mod frame;
mod voice;

use effect::EffectSpec;
use engine::Engine;
use frame::StereoFrame;

/// Main-thread side of a running output stream.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: Arc<AtomicU64>, // frames rendered, published by the callback
    failed: Arc<AtomicBool>, // set by the stream's error callback
    sample_rate: u32,
    suspended: bool,
    closed: bool,
    stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) -> anyhow::Result<()> {
        self.tx.try_send(cmd).context("audio command queue is full")
    }
}

impl AudioEngine for AudioHandle {
    fn now(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn state(&self) -> EngineState {
        if self.closed || self.failed.load(Ordering::Acquire) {
            EngineState::Closed
        } else if self.suspended {
            EngineState::Suspended
        } else {
            EngineState::Running
        }
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.closed, "output stream is closed");
        self.stream.play().context("failed to resume output stream")?;
        self.suspended = false;
        Ok(())
    }

    fn submit(&mut self, at: f64, hit: Hit) -> anyhow::Result<()> {
        anyhow::ensure!(self.state() != EngineState::Closed, "output stream is closed");
        let at_sample = (at.max(0.0) * self.sample_rate as f64).round() as u64;
        self.send(AudioCommand::Schedule { at_sample, hit })
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.send(AudioCommand::DropPending);
        if let Err(err) = self.stream.pause() {
            error!(%err, "failed to pause output stream on close");
        }
        self.closed = true;
        info!("audio engine closed");
    }
}

/// Opens the default output device. Each call builds a fresh stream with its
/// own clock starting at zero; the stream comes up suspended and the first
/// `resume` starts it.
pub struct CpalConnector {
    pub master_gain: f32,
}

impl EngineConnector for CpalConnector {
    fn connect(&mut self) -> anyhow::Result<Box<dyn AudioEngine>> {
        Ok(Box::new(start_audio(self.master_gain)?))
    }
}

pub fn start_audio(master_gain: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let clock = Arc::new(AtomicU64::new(0));
    let failed = Arc::new(AtomicBool::new(false));
    let master = effect::master_chain(master_gain);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate, &master);
            let stream = build_output_stream_f32(
                &device, &config.into(), rx, engine, channels, clock.clone(), failed.clone(),
            )?;

            let chain: Vec<String> = master.iter().map(EffectSpec::label).collect();
            info!(sample_rate, channels, master = ?chain, "audio engine opened");

            Ok(AudioHandle {
                tx,
                clock,
                failed,
                sample_rate,
                suspended: true,
                closed: false,
                stream,
            })
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
    clock: Arc<AtomicU64>,
    failed: Arc<AtomicBool>,
) -> anyhow::Result<cpal::Stream> {
    // grown only when the host hands us a bigger block than before
    let mut scratch: Vec<StereoFrame> = Vec::with_capacity(4096);

    let err_fn = move |err: cpal::StreamError| {
        error!(%err, "audio output stream error");
        failed.store(true, Ordering::Release);
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() { // set up command handling
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            scratch.resize(n_frames, StereoFrame::zero());
            engine.render_block(&mut scratch);

            for (out, frame) in data.chunks_mut(channels.max(1)).zip(scratch.iter()) {
                for (ch, sample) in out.iter_mut().enumerate() {
                    *sample = if ch % 2 == 0 { frame.left } else { frame.right };
                }
            }
            clock.store(engine.position(), Ordering::Release);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
