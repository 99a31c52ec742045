//! Pointer drag gestures, constrained to slide along the docked edge

use tracing::debug;

use crate::constants::mouse;
use crate::host::{CharacterPlayer, FrameClock, WindowHost};
use crate::overlay::Overlay;
use crate::types::{Edge, Position};

/// What a pointer release amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// No press was being tracked
    Idle,
    /// Press and release without passing the threshold
    Click,
    /// The window was dragged and snapped back onto the edge
    Dropped,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    pointer_origin: Position,
    window_origin: Position,
    started: bool,
}

#[derive(Debug)]
pub struct DragController {
    threshold: f64,
    gesture: Option<Gesture>,
}

impl DragController {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, gesture: None }
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn pointer_down<H, P, C>(&mut self, overlay: &Overlay<H, P, C>, button: u8, pointer: Position)
    where
        H: WindowHost,
        P: CharacterPlayer,
        C: FrameClock,
    {
        // Right button belongs to the context menu
        if button != mouse::BUTTON_LEFT || self.gesture.is_some() {
            return;
        }
        if let Some(window_origin) = overlay.begin_drag() {
            self.gesture = Some(Gesture {
                pointer_origin: pointer,
                window_origin,
                started: false,
            });
        }
    }

    pub fn pointer_move<H, P, C>(&mut self, overlay: &Overlay<H, P, C>, pointer: Position)
    where
        H: WindowHost,
        P: CharacterPlayer,
        C: FrameClock,
    {
        let Some(gesture) = self.gesture.as_mut() else { return };
        let dx = pointer.x - gesture.pointer_origin.x;
        let dy = pointer.y - gesture.pointer_origin.y;

        if !gesture.started {
            let distance = ((dx as f64).powi(2) + (dy as f64).powi(2)).sqrt();
            if distance < self.threshold {
                return;
            }
            gesture.started = true;
            debug!(distance = %distance, "Drag started");
        }

        overlay.drag_to(project(overlay.state().edge, gesture.window_origin, dx, dy));
    }

    pub fn pointer_up<H, P, C>(&mut self, overlay: &Overlay<H, P, C>) -> DragOutcome
    where
        H: WindowHost,
        P: CharacterPlayer,
        C: FrameClock,
    {
        let Some(gesture) = self.gesture.take() else {
            return DragOutcome::Idle;
        };
        overlay.end_drag(gesture.started);
        if gesture.started {
            DragOutcome::Dropped
        } else {
            DragOutcome::Click
        }
    }
}

/// Apply a pointer delta along the edge's tangent axis only
pub fn project(edge: Edge, origin: Position, dx: i32, dy: i32) -> Position {
    if edge.is_horizontal() {
        Position::new(origin.x + dx, origin.y)
    } else {
        Position::new(origin.x, origin.y + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tests::overlay_on;
    use crate::testing::FakeHost;
    use crate::types::Phase;
    use std::time::Duration;

    #[test]
    fn test_project_pins_normal_axis() {
        let origin = Position::new(860, 880);
        assert_eq!(project(Edge::Bottom, origin, 40, -300), Position::new(900, 880));
        assert_eq!(project(Edge::Top, origin, -10, 25), Position::new(850, 880));
        assert_eq!(project(Edge::Left, origin, 500, 12), Position::new(860, 892));
        assert_eq!(project(Edge::Right, origin, -3, -7), Position::new(860, 873));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bottom_drag_keeps_y_and_clamps_offset() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        overlay.show().await;
        host.clear_writes();
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(900, 950));
        for step in 1..=20 {
            drag.pointer_move(&overlay, Position::new(900 + step * 300, 950 - step * 7));
        }
        assert!(host.writes().iter().all(|p| p.y == 880));
        assert_eq!(host.current(), Position::new(860 + 6000, 880));

        assert_eq!(drag.pointer_up(&overlay), DragOutcome::Dropped);
        let state = overlay.state();
        assert_eq!(state.offset, 1.0);
        assert_eq!(state.phase, Phase::Visible);
        assert_eq!(host.current(), Position::new(1720, 880));
        assert!(!overlay.is_dragging());
    }

    #[tokio::test(start_paused = true)]
    async fn test_left_drag_moves_vertically() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Left, 0.5);
        overlay.show().await;
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(50, 500));
        drag.pointer_move(&overlay, Position::new(400, 280));
        assert_eq!(host.current(), Position::new(0, 220));

        drag.pointer_up(&overlay);
        assert!((overlay.state().offset - 0.25).abs() < 1e-9);
        assert_eq!(host.current(), Position::new(0, 220));
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_movement_is_a_click() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        overlay.show().await;
        host.clear_writes();
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(900, 950));
        drag.pointer_move(&overlay, Position::new(903, 953));

        assert_eq!(drag.pointer_up(&overlay), DragOutcome::Click);
        assert!(host.writes().is_empty());
        assert_eq!(overlay.state().offset, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_right_button_never_drags() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        overlay.show().await;
        host.clear_writes();
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_RIGHT, Position::new(900, 950));
        drag.pointer_move(&overlay, Position::new(1200, 950));

        assert!(!drag.is_active());
        assert_eq!(drag.pointer_up(&overlay), DragOutcome::Idle);
        assert!(host.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_refused_while_animating() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        let mut drag = DragController::new(5.0);

        let grab = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(900, 950));
            drag.is_active()
        };
        let ((), grabbed) = tokio::join!(overlay.show(), grab);

        assert!(!grabbed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_and_hide_wait_for_drag_release() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        overlay.show().await;
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(900, 950));
        overlay.hide().await;
        assert_eq!(overlay.state().phase, Phase::Visible);

        drag.pointer_up(&overlay);
        overlay.hide().await;
        assert_eq!(overlay.state().phase, Phase::Hidden);
        assert_eq!(player.plays().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_while_hidden_snaps_to_hidden_position() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        let (overlay, _player) = overlay_on(host.clone(), Edge::Bottom, 0.5);
        overlay.park();
        let mut drag = DragController::new(5.0);

        drag.pointer_down(&overlay, mouse::BUTTON_LEFT, Position::new(900, 1060));
        drag.pointer_move(&overlay, Position::new(40, 1060));
        drag.pointer_up(&overlay);

        assert_eq!(host.current(), Position::new(0, 1050));
        assert_eq!(overlay.state().offset, 0.0);
    }
}
