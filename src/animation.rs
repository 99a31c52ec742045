//! Position tweening for the overlay window

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::host::{FrameClock, WindowHost};
use crate::types::Position;

/// Quadratic ease-in-out over [0, 1]
pub fn ease_in_out(progress: f64) -> f64 {
    if progress < 0.5 {
        2.0 * progress * progress
    } else {
        1.0 - (-2.0 * progress + 2.0).powi(2) / 2.0
    }
}

/// Interpolated pixel position, or `None` if the sample is not finite
pub fn sample(from: Position, to: Position, eased: f64) -> Option<Position> {
    let x = from.x as f64 + (to.x - from.x) as f64 * eased;
    let y = from.y as f64 + (to.y - from.y) as f64 * eased;
    (x.is_finite() && y.is_finite()).then(|| Position::new(x.round() as i32, y.round() as i32))
}

/// Frame clock ticking at the display refresh rate
#[derive(Debug, Clone, Copy)]
pub struct RefreshClock {
    period: Duration,
}

impl RefreshClock {
    pub fn new(rate_hz: u32) -> Self {
        let rate = rate_hz.max(1) as u64;
        Self {
            period: Duration::from_nanos(1_000_000_000 / rate),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameClock for RefreshClock {
    async fn next_frame(&self) {
        tokio::time::sleep(self.period).await;
    }
}

/// Moves a window from wherever it is to a target over a fixed duration
pub struct PositionAnimator<C> {
    clock: C,
}

impl<C: FrameClock> PositionAnimator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Tween the window to `target`. The origin is read once up front and the
    /// future resolves when the final frame has been written.
    pub async fn animate_to<H: WindowHost>(&self, host: &H, target: Position, duration: Duration) {
        if duration.is_zero() {
            apply(host, target);
            return;
        }

        let from = match host.position() {
            Ok(position) => position,
            Err(e) => {
                warn!(error = ?e, target = ?target, "Cannot read window origin, jumping to target");
                apply(host, target);
                return;
            }
        };

        debug!(from = ?from, to = ?target, duration_ms = duration.as_millis() as u64, "Animating window");
        let start = Instant::now();
        loop {
            let progress = (start.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0);
            let eased = ease_in_out(progress);
            match sample(from, target, eased) {
                Some(position) => apply(host, position),
                None => error!(from = ?from, to = ?target, eased = %eased, "Invalid position in animation, skipping frame"),
            }
            if progress >= 1.0 {
                break;
            }
            self.clock.next_frame().await;
        }
    }
}

fn apply<H: WindowHost>(host: &H, position: Position) {
    if let Err(e) = host.set_position(position) {
        warn!(error = ?e, x = position.x, y = position.y, "Window move rejected, skipping frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, FakeHost};

    #[test]
    fn test_ease_in_out_endpoints_and_midpoint() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
    }

    #[test]
    fn test_sample_midpoint() {
        let from = Position::new(0, 880);
        let to = Position::new(860, 880);
        assert_eq!(sample(from, to, ease_in_out(0.5)), Some(Position::new(430, 880)));
    }

    #[test]
    fn test_sample_rejects_non_finite() {
        assert_eq!(sample(Position::new(0, 0), Position::new(10, 10), f64::NAN), None);
    }

    #[test]
    fn test_refresh_clock_period() {
        assert_eq!(RefreshClock::new(50).period(), Duration::from_millis(20));
        // Zero rate must not divide by zero
        assert_eq!(RefreshClock::new(0).period(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_applies_immediately() {
        let host = FakeHost::full_hd(Position::new(10, 10));
        let animator = PositionAnimator::new(FakeClock::default());

        animator.animate_to(&host, Position::new(860, 880), Duration::ZERO).await;

        assert_eq!(host.writes(), vec![Position::new(860, 880)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_ends_on_target_and_is_monotonic() {
        let host = FakeHost::full_hd(Position::new(0, 880));
        let clock = FakeClock::default();
        let animator = PositionAnimator::new(clock.clone());
        let started = Instant::now();

        animator.animate_to(&host, Position::new(860, 880), Duration::from_millis(1000)).await;

        assert!(started.elapsed() >= Duration::from_millis(1000));
        let writes = host.writes();
        assert_eq!(writes.first(), Some(&Position::new(0, 880)));
        assert_eq!(writes.last(), Some(&Position::new(860, 880)));
        assert!(writes.windows(2).all(|w| w[0].x <= w[1].x));
        assert!(writes.iter().all(|p| p.y == 880));
        // One write per frame plus the initial sample
        assert_eq!(writes.len(), clock.frames() + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_writes_do_not_abort() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        host.fail_writes(true);
        let animator = PositionAnimator::new(FakeClock::default());

        animator.animate_to(&host, Position::new(100, 0), Duration::from_millis(100)).await;

        assert!(host.writes().is_empty());
        assert_eq!(host.current(), Position::new(0, 0));
        assert!(host.rejected() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_origin_jumps_to_target() {
        let host = FakeHost::full_hd(Position::new(0, 0));
        host.fail_reads(true);
        let animator = PositionAnimator::new(FakeClock::default());

        animator.animate_to(&host, Position::new(50, 60), Duration::from_millis(500)).await;

        assert_eq!(host.writes(), vec![Position::new(50, 60)]);
    }
}
