//! Scheduler / transport.
//!
//! Owns the one audio engine and at most one playing episode. A successful
//! [`Transport::begin`] samples the raster, derives the tempo and slots,
//! submits every fired hit for the whole loop against the engine clock, and
//! hands back a [`FeedHandle`]. After that the UI loop calls
//! [`Transport::tick`] once per frame; the tick that sees the loop run out
//! moves back to idle and cancels the handle.
//!
//! ```text
//! Idle --begin--> Generating --scheduled--> Playing --10 s / stop--> Idle
//!                     |
//!                     +-- no drawing / no engine --> Idle (error)
//! ```

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::derive::{Tempo, derive_slots};
use super::feed::{CancelToken, FeedHandle, FeedSink, progress_frame};
use super::policy::{Dice, decide_slot};
use super::raster::{self, IntensityProfile, Raster};
use crate::audio_api::{AudioEngine, EngineConnector, EngineState};
use crate::shared::LOOP_SECONDS;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No waveform detected. Please draw something.")]
    NoDrawingDetected,
    #[error("Audio unavailable: {0}")]
    AudioEngineUnavailable(String),
    #[error("Already playing.")]
    AlreadyPlaying,
}

// slack on top of the loop before the wall clock overrides the audio clock
const WALL_CLOCK_GRACE: Duration = Duration::from_secs(2);

fn unavailable(err: anyhow::Error) -> PlaybackError {
    PlaybackError::AudioEngineUnavailable(format!("{err:#}"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    Playing,
}

/// Snapshot of the transport for display.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub phase: Phase,
    pub loop_start: Option<f64>,
    pub loop_duration: f64,
    pub tempo: Option<Tempo>,
}

struct Episode {
    id: u64,
    profile: IntensityProfile,
    tempo: Tempo,
    loop_start: f64,
    deadline: Instant, // wall-clock backstop if the audio clock stalls
    token: CancelToken,
}

pub struct Transport<D: Dice> {
    connector: Box<dyn EngineConnector>,
    engine: Option<Box<dyn AudioEngine>>,
    phase: Phase,
    episode: Option<Episode>,
    episodes: u64,
    dice: D,
    last_tempo: Option<Tempo>,
}

impl<D: Dice> Transport<D> {
    pub fn new(connector: Box<dyn EngineConnector>, dice: D) -> Self {
        Self {
            connector,
            engine: None,
            phase: Phase::Idle,
            episode: None,
            episodes: 0,
            dice,
            last_tempo: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            phase: self.phase,
            loop_start: self.episode.as_ref().map(|e| e.loop_start),
            loop_duration: LOOP_SECONDS as f64,
            tempo: self.episode.as_ref().map(|e| e.tempo).or(self.last_tempo),
        }
    }

    pub fn begin(
        &mut self,
        raster: &Raster,
        sink: &mut dyn FeedSink,
    ) -> Result<FeedHandle, PlaybackError> {
        if self.phase != Phase::Idle {
            debug!("begin ignored, episode already running");
            return Err(PlaybackError::AlreadyPlaying);
        }
        self.phase = Phase::Generating;

        let line = raster::sample(raster);
        if line.is_empty_drawing() {
            info!("no drawing detected");
            self.phase = Phase::Idle;
            return Err(PlaybackError::NoDrawingDetected);
        }

        let mut engine = match self.ensure_engine() {
            Ok(engine) => engine,
            Err(err) => {
                warn!(%err, "audio engine unavailable");
                self.phase = Phase::Idle;
                return Err(err);
            }
        };

        let (tempo, slots) = derive_slots(&line);
        let beat = tempo.beat_seconds();
        let loop_seconds = LOOP_SECONDS as f64;
        let loop_start = engine.now();
        info!(bpm = tempo.bpm, slots = slots.len(), loop_start, "episode started");

        let first = progress_frame(&line.profile, 0.0, loop_seconds, &mut self.dice);
        sink.push(first);

        for (i, params) in slots.iter().enumerate() {
            let slot_time = loop_start + i as f64 * beat;
            let triggers = decide_slot(params, slot_time, beat, &mut self.dice);
            for trigger in &triggers {
                let Some(hit) = trigger.hit else { continue };
                // a bad submission only costs this one hit
                if let Err(err) = engine.submit(trigger.time, hit) {
                    warn!(instrument = hit.instrument().label(), %err, "hit dropped");
                }
            }
            let fired = triggers.iter().filter(|t| t.fired()).count();
            debug!(slot = i, intensity = params.intensity, fired, "slot scheduled");

            let elapsed = engine.now() - loop_start;
            let frame = progress_frame(&line.profile, elapsed, loop_seconds, &mut self.dice);
            sink.push(frame);
        }

        self.episodes += 1;
        let token = CancelToken::new();
        let handle = FeedHandle::new(self.episodes, token.clone());
        self.episode = Some(Episode {
            id: self.episodes,
            profile: line.profile,
            tempo,
            loop_start,
            deadline: Instant::now() + Duration::from_secs(LOOP_SECONDS as u64) + WALL_CLOCK_GRACE,
            token,
        });
        self.engine = Some(engine);
        self.last_tempo = Some(tempo);
        self.phase = Phase::Playing;
        Ok(handle)
    }

    /// One animation frame. Returns true on the frame the episode finishes.
    pub fn tick(&mut self, sink: &mut dyn FeedSink) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some((now, engine_state)) = self.engine.as_ref().map(|e| (e.now(), e.state())) else {
            self.finish();
            return true;
        };
        let Some(episode) = self.episode.as_ref() else {
            self.finish();
            return true;
        };

        // a dead stream stops its clock, so the loop would never run out
        if engine_state == EngineState::Closed {
            warn!(episode = episode.id, "audio engine closed mid-episode");
            self.finish();
            return true;
        }
        if Instant::now() >= episode.deadline {
            warn!(episode = episode.id, "audio clock stalled, ending episode");
            self.finish();
            return true;
        }

        let loop_seconds = LOOP_SECONDS as f64;
        let elapsed = now - episode.loop_start;
        if elapsed >= loop_seconds {
            info!(episode = episode.id, "episode finished");
            self.finish();
            return true;
        }

        let frame = progress_frame(&episode.profile, elapsed, loop_seconds, &mut self.dice);
        sink.push(frame);
        false
    }

    /// Tears the episode down early. The feed stops; hits already handed to
    /// the engine still play.
    pub fn stop(&mut self) {
        if self.episode.is_some() {
            info!("episode stopped");
        }
        self.finish();
    }

    pub fn dispose(&mut self) {
        self.finish();
        if let Some(mut engine) = self.engine.take() {
            engine.close();
        }
    }

    fn finish(&mut self) {
        if let Some(episode) = self.episode.take() {
            episode.token.cancel();
        }
        self.phase = Phase::Idle;
    }

    // Takes the engine out of `self`, connecting or resuming as needed. On
    // failure nothing is put back, so the next attempt starts from scratch.
    fn ensure_engine(&mut self) -> Result<Box<dyn AudioEngine>, PlaybackError> {
        let mut engine = match self.engine.take() {
            Some(engine) if engine.state() != EngineState::Closed => engine,
            _ => {
                info!("connecting audio engine");
                self.connector.connect().map_err(unavailable)?
            }
        };
        if engine.state() == EngineState::Suspended {
            engine.resume().map_err(unavailable)?;
        }
        Ok(engine)
    }
}

impl<D: Dice> Drop for Transport<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}
