//! In-memory fakes of the host traits for unit tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::types::{PlayDirection, Position, Rect, Rotation};
use crate::x11_utils::nearest_display;

pub const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug)]
struct HostState {
    position: Cell<Position>,
    writes: RefCell<Vec<Position>>,
    work_area: Cell<Option<Rect>>,
    displays: RefCell<Vec<Rect>>,
    fail_writes: Cell<bool>,
    fail_reads: Cell<bool>,
    rejected: Cell<usize>,
    closed: Cell<bool>,
}

/// Window host that records every move
#[derive(Debug, Clone)]
pub struct FakeHost(Rc<HostState>);

impl FakeHost {
    pub fn new(position: Position, work_area: Rect, displays: Vec<Rect>) -> Self {
        Self(Rc::new(HostState {
            position: Cell::new(position),
            writes: RefCell::new(Vec::new()),
            work_area: Cell::new(Some(work_area)),
            displays: RefCell::new(displays),
            fail_writes: Cell::new(false),
            fail_reads: Cell::new(false),
            rejected: Cell::new(0),
            closed: Cell::new(false),
        }))
    }

    /// Several displays without panels; the work area is whichever display
    /// is nearest to the queried point
    pub fn stacked(position: Position, displays: Vec<Rect>) -> Self {
        let host = Self::new(position, Rect::default(), displays);
        host.0.work_area.set(None);
        host
    }

    /// Single 1920x1080 display with no panels
    pub fn full_hd(position: Position) -> Self {
        let screen = Rect::new(0, 0, 1920, 1080);
        Self::new(position, screen, vec![screen])
    }

    pub fn writes(&self) -> Vec<Position> {
        self.0.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.0.writes.borrow_mut().clear();
    }

    pub fn current(&self) -> Position {
        self.0.position.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.fail_writes.set(fail);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.0.fail_reads.set(fail);
    }

    pub fn rejected(&self) -> usize {
        self.0.rejected.get()
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.get()
    }
}

impl WindowHost for FakeHost {
    fn position(&self) -> Result<Position> {
        if self.0.fail_reads.get() {
            return Err(anyhow!("position unavailable"));
        }
        Ok(self.0.position.get())
    }

    fn set_position(&self, position: Position) -> Result<()> {
        if self.0.fail_writes.get() {
            self.0.rejected.set(self.0.rejected.get() + 1);
            return Err(anyhow!("move rejected"));
        }
        self.0.position.set(position);
        self.0.writes.borrow_mut().push(position);
        Ok(())
    }

    fn bounds(&self) -> Result<Rect> {
        let position = self.position()?;
        Ok(Rect::new(position.x, position.y, 200, 200))
    }

    fn work_area_near(&self, point: Position) -> Result<Rect> {
        if self.0.fail_reads.get() {
            return Err(anyhow!("no display"));
        }
        match self.0.work_area.get() {
            Some(work_area) => Ok(work_area),
            None => nearest_display(&self.0.displays.borrow(), point).ok_or_else(|| anyhow!("no display")),
        }
    }

    fn displays(&self) -> Result<Vec<Rect>> {
        Ok(self.0.displays.borrow().clone())
    }

    fn close(&self) -> Result<()> {
        self.0.closed.set(true);
        Ok(())
    }
}

/// Character player recording playback commands
#[derive(Debug, Clone, Default)]
pub struct FakePlayer {
    plays: Rc<RefCell<Vec<(PlayDirection, Option<u32>)>>>,
    rotation: Rc<Cell<Rotation>>,
}

impl FakePlayer {
    pub fn plays(&self) -> Vec<(PlayDirection, Option<u32>)> {
        self.plays.borrow().clone()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation.get()
    }
}

impl CharacterPlayer for FakePlayer {
    fn play(&self, direction: PlayDirection, start_frame: Option<u32>) {
        self.plays.borrow_mut().push((direction, start_frame));
    }

    fn set_rotation(&self, rotation: Rotation) {
        self.rotation.set(rotation);
    }

    async fn ready(&self) {}
}

/// Frame clock advancing tokio's (paused) clock by one 16ms frame
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    frames: Rc<Cell<usize>>,
}

impl FakeClock {
    pub fn frames(&self) -> usize {
        self.frames.get()
    }
}

impl FrameClock for FakeClock {
    async fn next_frame(&self) {
        tokio::time::sleep(FRAME).await;
        self.frames.set(self.frames.get() + 1);
    }
}
