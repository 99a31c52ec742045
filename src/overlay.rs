//! Visibility state machine for the overlay
//!
//! Owns the edge, offset and phase of the overlay. Every entry point (the
//! autopilot, user commands, drag gestures) goes through the operations here;
//! the phase and drag guards drop requests that arrive while a transition is
//! already running instead of queueing them.

use std::cell::Cell;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::animation::PositionAnimator;
use crate::geometry::{GeometryConfig, Screen, display_anchor, offset_from_position, resolve_position};
use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::types::{Edge, Phase, PlayDirection, Position};

/// Durations of the appear/stay/hide sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub appear: Duration,
    pub hide: Duration,
    pub stay: Duration,
    /// Pause between hiding on the old edge and showing on a new one
    pub settle: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    pub edge: Edge,
    pub offset: f64,
    pub phase: Phase,
}

pub struct Overlay<H, P, C> {
    host: H,
    player: P,
    animator: PositionAnimator<C>,
    geometry: GeometryConfig,
    timings: Timings,
    state: Cell<OverlayState>,
    dragging: Cell<bool>,
}

impl<H: WindowHost, P: CharacterPlayer, C: FrameClock> Overlay<H, P, C> {
    pub fn new(
        host: H,
        player: P,
        clock: C,
        geometry: GeometryConfig,
        timings: Timings,
        edge: Edge,
        offset: f64,
    ) -> Self {
        Self {
            host,
            player,
            animator: PositionAnimator::new(clock),
            geometry,
            timings,
            state: Cell::new(OverlayState {
                edge,
                offset: clamp_offset(offset),
                phase: Phase::Hidden,
            }),
            dragging: Cell::new(false),
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state.get()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.get()
    }

    fn update(&self, change: impl FnOnce(&mut OverlayState)) {
        let mut state = self.state.get();
        change(&mut state);
        self.state.set(state);
    }

    /// Work area and neighbors of the display the window is currently on
    fn screen(&self) -> Option<Screen> {
        let bounds = match self.host.bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!(error = ?e, "Failed to query window bounds");
                return None;
            }
        };
        let anchor = display_anchor(self.state.get().edge, bounds);
        let work_area = match self.host.work_area_near(anchor) {
            Ok(work_area) => work_area,
            Err(e) => {
                warn!(error = ?e, "Failed to query work area");
                return None;
            }
        };
        let displays = self.host.displays().unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to enumerate displays, assuming no neighbors");
            Vec::new()
        });
        Some(Screen::detect(work_area, &displays, self.geometry.adjacent_tolerance))
    }

    fn write_position(&self, position: Position) {
        if let Err(e) = self.host.set_position(position) {
            warn!(error = ?e, x = position.x, y = position.y, "Window move rejected");
        }
    }

    /// Put the window at the hidden position of the current edge without animating
    pub fn park(&self) {
        let state = self.state.get();
        let Some(screen) = self.screen() else { return };
        let placement = resolve_position(state.edge, state.offset, &screen, true, &self.geometry);
        self.player.set_rotation(placement.rotation);
        self.write_position(placement.position);
        debug!(edge = %state.edge, position = ?placement.position, "Parked overlay");
    }

    pub async fn show(&self) {
        let state = self.state.get();
        if state.phase != Phase::Hidden || self.dragging.get() {
            debug!(phase = ?state.phase, dragging = self.dragging.get(), "Show ignored, overlay busy or visible");
            return;
        }
        let Some(screen) = self.screen() else { return };
        self.update(|s| s.phase = Phase::Appearing);

        let hidden = resolve_position(state.edge, state.offset, &screen, true, &self.geometry);
        let visible = resolve_position(state.edge, state.offset, &screen, false, &self.geometry);
        info!(edge = %state.edge, offset = %state.offset, "Showing overlay");

        self.player.set_rotation(visible.rotation);
        self.write_position(hidden.position);
        self.player.play(PlayDirection::Forward, Some(0));
        self.animator
            .animate_to(&self.host, visible.position, self.timings.appear)
            .await;

        self.update(|s| s.phase = Phase::Visible);
    }

    pub async fn hide(&self) {
        let state = self.state.get();
        if state.phase != Phase::Visible || self.dragging.get() {
            debug!(phase = ?state.phase, dragging = self.dragging.get(), "Hide ignored, overlay busy or hidden");
            return;
        }
        let Some(screen) = self.screen() else { return };
        self.update(|s| s.phase = Phase::Hiding);

        let hidden = resolve_position(state.edge, state.offset, &screen, true, &self.geometry);
        info!(edge = %state.edge, offset = %state.offset, "Hiding overlay");

        self.player.play(PlayDirection::Reverse, None);
        self.animator
            .animate_to(&self.host, hidden.position, self.timings.hide)
            .await;

        self.update(|s| s.phase = Phase::Hidden);
    }

    /// Show, stay, hide
    pub async fn peek_cycle(&self) {
        self.show().await;
        tokio::time::sleep(self.timings.stay).await;
        self.hide().await;
    }

    /// Hide if visible, otherwise run a peek cycle
    pub async fn toggle(&self) {
        if self.state.get().phase.is_visible() {
            self.hide().await;
        } else {
            self.peek_cycle().await;
        }
    }

    /// Retreat from the current edge (if visible), switch edges, then peek
    pub async fn move_to_edge(&self, edge: Edge, offset: f64) {
        let phase = self.state.get().phase;
        if phase.is_animating() || self.dragging.get() {
            debug!(phase = ?phase, edge = %edge, "Move ignored, overlay busy");
            return;
        }
        if phase.is_visible() {
            self.hide().await;
            tokio::time::sleep(self.timings.settle).await;
        }
        if !self.relocate(edge, offset) {
            return;
        }
        self.peek_cycle().await;
    }

    /// Switch edge and offset. Only allowed while fully hidden so the
    /// orientation never changes on screen.
    pub fn relocate(&self, edge: Edge, offset: f64) -> bool {
        let phase = self.state.get().phase;
        if phase != Phase::Hidden || self.dragging.get() {
            debug!(phase = ?phase, edge = %edge, "Relocation dropped, overlay not hidden");
            return false;
        }
        let offset = clamp_offset(offset);
        info!(edge = %edge, offset = %offset, "Relocating overlay");
        self.update(|s| {
            s.edge = edge;
            s.offset = offset;
        });
        self.park();
        true
    }

    pub fn close(&self) {
        info!("Closing overlay");
        if let Err(e) = self.host.close() {
            warn!(error = ?e, "Failed to close overlay window");
        }
    }

    /// Claim the window for a drag gesture; returns the window origin
    pub fn begin_drag(&self) -> Option<Position> {
        let phase = self.state.get().phase;
        if phase.is_animating() || self.dragging.get() {
            debug!(phase = ?phase, "Drag refused while animating");
            return None;
        }
        match self.host.position() {
            Ok(origin) => {
                self.dragging.set(true);
                Some(origin)
            }
            Err(e) => {
                warn!(error = ?e, "Cannot read window position, not starting drag");
                None
            }
        }
    }

    /// Move the window during a drag gesture
    pub fn drag_to(&self, position: Position) {
        if self.dragging.get() {
            self.write_position(position);
        }
    }

    /// Release the drag claim. When the window actually moved, derive the new
    /// offset from where it was dropped and snap it back onto the edge.
    pub fn end_drag(&self, moved: bool) {
        if !self.dragging.replace(false) || !moved {
            return;
        }
        let dropped = match self.host.position() {
            Ok(position) => position,
            Err(e) => {
                warn!(error = ?e, "Cannot read window position after drag");
                return;
            }
        };
        let Some(screen) = self.screen() else { return };

        let state = self.state.get();
        let offset = offset_from_position(state.edge, dropped, screen.work_area, self.geometry.footprint);
        self.update(|s| s.offset = offset);

        let hidden = !state.phase.is_visible();
        let snapped = resolve_position(state.edge, offset, &screen, hidden, &self.geometry);
        info!(edge = %state.edge, offset = %offset, position = ?snapped.position, "Drag finished, snapping to edge");
        self.write_position(snapped.position);
    }
}

fn clamp_offset(offset: f64) -> f64 {
    if offset.is_finite() {
        offset.clamp(0.0, 1.0)
    } else {
        warn!(offset = %offset, "Non-finite offset, using 0");
        0.0
    }
}
