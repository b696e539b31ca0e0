// Sits between the TUI and the core: turns input events into canvas edits
// and transport calls, and keeps the status line and display state current.
use tracing::debug;

use crate::beat::feed::{FeedFrame, FeedHandle, FeedSink};
use crate::beat::policy::Dice;
use crate::beat::transport::{Phase, Transport};
use crate::canvas::Canvas;
use crate::shared::{DisplayState, InputEvent};

pub const STATUS_DRAWN: &str = "Drawing updated. Ready to generate beat.";
pub const STATUS_CLEARED: &str = "Canvas cleared.";
pub const STATUS_PLAYING: &str = "Playing beat...";
pub const STATUS_DONE: &str = "Beat playback completed.";

// the visualizer only ever shows the newest frame
#[derive(Default)]
struct LatestFrame(Option<FeedFrame>);

impl FeedSink for LatestFrame {
    fn push(&mut self, frame: FeedFrame) {
        self.0 = Some(frame);
    }
}

pub struct Middle<D: Dice> {
    canvas: Canvas,
    transport: Transport<D>,
    feed: LatestFrame,
    handle: Option<FeedHandle>,
    status: String,
    display: DisplayState,
}

impl<D: Dice> Middle<D> {
    pub fn new(transport: Transport<D>, line_thickness: u32) -> Self {
        Self {
            canvas: Canvas::new(line_thickness),
            transport,
            feed: LatestFrame::default(),
            handle: None,
            status: String::new(),
            display: DisplayState::default(),
        }
    }

    pub fn line_thickness(&self) -> u32 {
        self.canvas.thickness()
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::DrawAt(x, y) => {
                self.canvas.draw_to(x, y);
                self.set_status(STATUS_DRAWN);
            }
            InputEvent::PenUp => {
                if self.canvas.pen_up() {
                    self.set_status(STATUS_DRAWN);
                }
            }
            InputEvent::BeatIt => self.beat_it(),
            InputEvent::ClearCanvas => {
                // clearing mid-loop ends the episode; queued hits still sound
                if self.transport.is_playing() {
                    self.transport.stop();
                    self.handle = None;
                }
                self.canvas.clear();
                self.feed = LatestFrame::default();
                self.set_status(STATUS_CLEARED);
            }
            InputEvent::Thinner => {
                self.canvas.set_thickness(self.canvas.thickness().saturating_sub(1));
            }
            InputEvent::Thicker => self.canvas.set_thickness(self.canvas.thickness() + 1),
            InputEvent::Quit => {} // handled by the run loop
        }
    }

    fn beat_it(&mut self) {
        // the button is disabled while a beat plays
        if self.transport.is_playing() {
            debug!("beat requested while playing, ignored");
            return;
        }
        match self.transport.begin(self.canvas.raster(), &mut self.feed) {
            Ok(handle) => {
                debug!(episode = handle.episode, "beat started");
                self.handle = Some(handle);
                self.set_status(STATUS_PLAYING);
            }
            Err(err) => self.set_status(&err.to_string()),
        }
    }

    pub fn tick(&mut self) {
        if self.handle.as_ref().is_some_and(|h| !h.is_live()) {
            self.handle = None;
        }
        if self.transport.tick(&mut self.feed) {
            self.handle = None;
            self.set_status(STATUS_DONE);
        }
    }

    pub fn shutdown(&mut self) {
        self.handle = None;
        self.transport.dispose();
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    pub fn display_state(&mut self) -> &DisplayState {
        let state = self.transport.state();
        let d = &mut self.display;
        d.playing = state.phase != Phase::Idle;
        d.bpm = state.tempo.map(|t| t.bpm);
        d.line_thickness = self.canvas.thickness();
        d.status_text.clone_from(&self.status);
        d.ink.clear();
        d.ink.extend_from_slice(self.canvas.ink_points());
        d.bars.clear();
        match &self.feed.0 {
            Some(frame) => {
                d.bars.extend(frame.window.iter().map(|p| p.intensity));
                d.playhead = frame.playhead;
            }
            None => d.playhead = 0.0,
        }
        d.elapsed = state.loop_start.map(|_| d.playhead * state.loop_duration);
        &self.display
    }
}
