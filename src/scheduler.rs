//! Autopilot: keeps the cat peeking and occasionally moves it somewhere new

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::overlay::Overlay;
use crate::types::Edge;

/// Source of uniform samples in [0, 1)
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// OS-seeded generator used outside of tests
pub struct SystemRandom(StdRng);

impl SystemRandom {
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl RandomSource for SystemRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.random()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    /// Wait after the character is ready before the first peek
    pub start_delay: Duration,
    /// Pause between the end of one peek and the next
    pub cycle_delay: Duration,
    pub edge_change_probability: f64,
    pub offset_range: (f64, f64),
    pub edges: Vec<Edge>,
}

pub struct Scheduler<R> {
    settings: CycleSettings,
    rng: R,
}

impl<R: RandomSource> Scheduler<R> {
    pub fn new(settings: CycleSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    /// Run peek cycles forever, starting once the character has loaded
    pub async fn run<H, P, C>(&mut self, overlay: &Overlay<H, P, C>)
    where
        H: WindowHost,
        P: CharacterPlayer,
        C: FrameClock,
    {
        overlay.player().ready().await;
        info!(start_delay_ms = self.settings.start_delay.as_millis() as u64, "Character ready, starting autopilot");
        tokio::time::sleep(self.settings.start_delay).await;
        loop {
            self.cycle(overlay).await;
        }
    }

    /// One peek, the inter-cycle pause, then maybe a relocation
    pub async fn cycle<H, P, C>(&mut self, overlay: &Overlay<H, P, C>)
    where
        H: WindowHost,
        P: CharacterPlayer,
        C: FrameClock,
    {
        overlay.peek_cycle().await;
        tokio::time::sleep(self.settings.cycle_delay).await;
        if let Some((edge, offset)) = self.pick_relocation() {
            overlay.relocate(edge, offset);
        }
    }

    /// Roll for a new edge and offset
    pub fn pick_relocation(&mut self) -> Option<(Edge, f64)> {
        if self.settings.edges.is_empty() || self.rng.next_f64() >= self.settings.edge_change_probability {
            return None;
        }
        let edges = &self.settings.edges;
        let index = ((self.rng.next_f64() * edges.len() as f64) as usize).min(edges.len() - 1);
        let (min, max) = self.settings.offset_range;
        let offset = min + self.rng.next_f64() * (max - min);
        debug!(edge = %edges[index], offset = %offset, "Autopilot picked a new spot");
        Some((edges[index], offset))
    }
}
