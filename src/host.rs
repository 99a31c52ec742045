//! Collaborator interfaces the overlay core drives
//!
//! The X11 implementations live in `x11_utils` and `character`; tests use
//! in-memory fakes.

use std::future::Future;

use anyhow::Result;

use crate::types::{PlayDirection, Position, Rect, Rotation};

/// The OS window the overlay lives in
pub trait WindowHost {
    /// Current top-left corner in root coordinates
    fn position(&self) -> Result<Position>;

    /// Move the window; called once per frame while animating
    fn set_position(&self, position: Position) -> Result<()>;

    fn bounds(&self) -> Result<Rect>;

    /// Usable area (minus panels/docks) of the display nearest `point`
    fn work_area_near(&self, point: Position) -> Result<Rect>;

    /// Bounds of every connected display
    fn displays(&self) -> Result<Vec<Rect>>;

    fn close(&self) -> Result<()>;
}

/// Playback control for the character animation
pub trait CharacterPlayer {
    /// Start playing; `None` continues from the current frame
    fn play(&self, direction: PlayDirection, start_frame: Option<u32>);

    fn set_rotation(&self, rotation: Rotation);

    /// Resolves once the character asset has loaded
    fn ready(&self) -> impl Future<Output = ()>;
}

/// Paces animation to the display refresh
pub trait FrameClock {
    fn next_frame(&self) -> impl Future<Output = ()>;
}
