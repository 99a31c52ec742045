//! Character animation timeline
//!
//! The character is described by a Lottie JSON file; only its timing header
//! (`fr`, `ip`, `op`) is read. Playback is tracked as a frame position that
//! advances with wall time, forwards while appearing and backwards while
//! hiding.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::character;
use crate::host::CharacterPlayer;
use crate::types::{PlayDirection, Rotation};

/// Timing header of a Lottie animation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AnimationInfo {
    /// Frames per second
    #[serde(rename = "fr")]
    pub frame_rate: f64,
    /// First frame
    #[serde(rename = "ip")]
    pub in_point: f64,
    /// One past the last frame
    #[serde(rename = "op")]
    pub out_point: f64,
}

impl Default for AnimationInfo {
    fn default() -> Self {
        Self {
            frame_rate: character::FRAME_RATE,
            in_point: 0.0,
            out_point: character::FRAME_COUNT as f64,
        }
    }
}

impl AnimationInfo {
    pub fn parse(json: &str) -> Result<Self> {
        let info: Self = serde_json::from_str(json).context("Failed to parse animation header")?;
        if !info.frame_rate.is_finite() || info.frame_rate <= 0.0 {
            anyhow::bail!("Invalid animation frame rate: {}", info.frame_rate);
        }
        if !info.in_point.is_finite() || !info.out_point.is_finite() || info.out_point <= info.in_point {
            anyhow::bail!("Invalid animation range: {}..{}", info.in_point, info.out_point);
        }
        Ok(info)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .context(format!("Failed to read character asset {}", path.display()))?;
        Self::parse(&json).context(format!("Invalid character asset {}", path.display()))
    }

    pub fn frame_count(&self) -> u32 {
        (self.out_point - self.in_point).ceil() as u32
    }

    fn last_frame(&self) -> f64 {
        (self.frame_count().saturating_sub(1)) as f64
    }
}

#[derive(Debug, Clone, Copy)]
struct Playback {
    direction: PlayDirection,
    start_frame: f64,
    started: Instant,
}

/// Playback state of the character
pub struct Timeline {
    info: AnimationInfo,
    playback: Cell<Option<Playback>>,
    rotation: Cell<Rotation>,
    ready: watch::Sender<bool>,
}

impl Timeline {
    pub fn new(info: AnimationInfo) -> Self {
        Self {
            info,
            playback: Cell::new(None),
            rotation: Cell::new(Rotation::default()),
            ready: watch::Sender::new(false),
        }
    }

    /// Load the configured asset, falling back to the built-in timeline.
    /// The returned timeline is always ready.
    pub fn load(asset: Option<&Path>) -> Self {
        let info = match asset.map(AnimationInfo::load) {
            Some(Ok(info)) => {
                info!(frames = info.frame_count(), frame_rate = %info.frame_rate, "Loaded character asset");
                info
            }
            Some(Err(e)) => {
                warn!(error = ?e, "Failed to load character asset, using built-in timeline");
                AnimationInfo::default()
            }
            None => AnimationInfo::default(),
        };
        let timeline = Self::new(info);
        timeline.mark_ready();
        timeline
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    #[cfg(test)]
    pub fn info(&self) -> &AnimationInfo {
        &self.info
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation.get()
    }

    /// Frame currently on screen, within `0..frame_count`
    pub fn current_frame(&self) -> u32 {
        self.position().floor() as u32
    }

    fn position(&self) -> f64 {
        let Some(playback) = self.playback.get() else {
            return 0.0;
        };
        let advanced = playback.started.elapsed().as_secs_f64() * self.info.frame_rate;
        let frame = match playback.direction {
            PlayDirection::Forward => playback.start_frame + advanced,
            PlayDirection::Reverse => playback.start_frame - advanced,
        };
        frame.clamp(0.0, self.info.last_frame())
    }
}

impl CharacterPlayer for Timeline {
    fn play(&self, direction: PlayDirection, start_frame: Option<u32>) {
        let start_frame = match start_frame {
            Some(frame) => (frame as f64).min(self.info.last_frame()),
            None => self.position(),
        };
        debug!(direction = ?direction, from = self.current_frame(), start_frame = %start_frame, "Playing character");
        self.playback.set(Some(Playback {
            direction,
            start_frame,
            started: Instant::now(),
        }));
    }

    fn set_rotation(&self, rotation: Rotation) {
        if self.rotation() != rotation {
            debug!(from = ?self.rotation(), to = ?rotation, "Rotating character");
        }
        self.rotation.set(rotation);
    }

    async fn ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = ready.wait_for(|ready| *ready).await;
    }
}
