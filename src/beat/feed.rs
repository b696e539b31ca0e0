// Progress feed for the visualizer: a rolling window of the profile around
// the playhead, with a bit of jitter so the bars move.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::policy::Dice;
use super::raster::IntensityProfile;
use crate::shared::FEED_WINDOW;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedPoint {
    pub position: f64, // 0..1 across the loop
    pub intensity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedFrame {
    pub window: Vec<FeedPoint>,
    pub playhead: f64,
}

/// The visualization side. Pure consumer, never talks back.
pub trait FeedSink {
    fn push(&mut self, frame: FeedFrame);
}

pub fn progress_frame(
    profile: &IntensityProfile,
    elapsed: f64,
    loop_seconds: f64,
    dice: &mut impl Dice,
) -> FeedFrame {
    let len = profile.len();
    let fraction = elapsed.rem_euclid(loop_seconds) / loop_seconds;
    if len == 0 {
        return FeedFrame { window: Vec::new(), playhead: fraction };
    }
    let current = (fraction * len as f64).floor() as usize;

    let window = (0..FEED_WINDOW)
        .map(|i| {
            let index = (current + i) % len;
            let jitter = 0.5 + dice.roll() * 0.5;
            FeedPoint {
                position: index as f64 / len as f64,
                intensity: profile.get(index).unwrap_or(0.0) * jitter,
            }
        })
        .collect();

    FeedFrame { window, playhead: fraction }
}

/// Shared flag between an episode and whoever drives its feed. Once
/// cancelled it stays cancelled; a new episode gets a new token.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Returned by a successful `begin`. Valid until the episode it belongs to
/// ends or is torn down.
#[derive(Clone, Debug)]
pub struct FeedHandle {
    pub episode: u64,
    token: CancelToken,
}

impl FeedHandle {
    pub fn new(episode: u64, token: CancelToken) -> Self {
        Self { episode, token }
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }
}
