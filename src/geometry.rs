//! Edge geometry: where the overlay sits for an edge, offset and phase

use tracing::warn;

use crate::types::{Edge, Placement, Position, Rect};

/// Geometry parameters of the overlay footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    pub footprint: i32,
    pub hidden_offset: i32,
    pub adjacent_tolerance: i32,
}

/// Which sides of the work area border another display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub left: bool,
    pub right: bool,
}

/// Work area of the display the overlay is on, plus its neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub work_area: Rect,
    pub neighbors: Neighbors,
}

impl Screen {
    /// Derive adjacency of `work_area` from the full display list
    pub fn detect(work_area: Rect, displays: &[Rect], tolerance: i32) -> Self {
        let center = work_area.center();
        let overlaps_vertically = |d: &Rect| d.top() < work_area.bottom() && d.bottom() > work_area.top();

        let mut neighbors = Neighbors::default();
        for display in displays.iter().filter(|d| !d.contains(center)) {
            if !overlaps_vertically(display) {
                continue;
            }
            if (display.right() - work_area.left()).abs() <= tolerance {
                neighbors.left = true;
            }
            if (display.left() - work_area.right()).abs() <= tolerance {
                neighbors.right = true;
            }
        }

        Self { work_area, neighbors }
    }
}

/// Resolve the window position and character rotation for an edge.
///
/// `offset` is the fractional position along the edge's tangent axis and is
/// clamped to [0, 1]. Non-finite intermediate values are replaced by 0.
pub fn resolve_position(
    edge: Edge,
    offset: f64,
    screen: &Screen,
    hidden: bool,
    geometry: &GeometryConfig,
) -> Placement {
    let wa = screen.work_area;
    let size = geometry.footprint as f64;
    let offset = finite_or_zero(offset, "offset").clamp(0.0, 1.0);

    let (x, y) = match edge {
        Edge::Bottom | Edge::Top => {
            let x = wa.x as f64 + (wa.width as f64 - size) * offset;
            let visible_y = match edge {
                Edge::Bottom => wa.bottom() as f64 - size,
                _ => wa.y as f64,
            };
            let y = match (edge, hidden) {
                (_, false) => visible_y,
                (Edge::Bottom, true) => visible_y + geometry.hidden_offset as f64,
                (_, true) => visible_y - geometry.hidden_offset as f64,
            };
            (x, y)
        }
        Edge::Left | Edge::Right => {
            let y = wa.y as f64 + (wa.height as f64 - size) * offset;
            let x = match (edge, hidden) {
                (Edge::Left, false) => wa.x as f64,
                // A neighbor on the left would show the overlay, so tuck it inside instead
                (Edge::Left, true) if screen.neighbors.left => wa.x as f64,
                (Edge::Left, true) => wa.x as f64 - size,
                (_, false) => wa.right() as f64 - size,
                (_, true) if screen.neighbors.right => wa.right() as f64 - size,
                (_, true) => wa.right() as f64,
            };
            (x, y)
        }
    };

    Placement {
        position: Position::new(to_pixel(x, "x"), to_pixel(y, "y")),
        rotation: edge.rotation(),
    }
}

/// Point of the window that stays on its display at every hidden and
/// visible position of `edge`: the side facing away from the docking edge.
pub fn display_anchor(edge: Edge, bounds: Rect) -> Position {
    let center = bounds.center();
    match edge {
        Edge::Bottom => Position::new(center.x, bounds.top()),
        Edge::Top => Position::new(center.x, bounds.bottom() - 1),
        Edge::Left => Position::new(bounds.right(), center.y),
        Edge::Right => Position::new(bounds.left() - 1, center.y),
    }
}

/// Inverse of the tangent-axis formula, used after a drag
pub fn offset_from_position(edge: Edge, position: Position, work_area: Rect, footprint: i32) -> f64 {
    let (origin, span, coord) = if edge.is_horizontal() {
        (work_area.x, work_area.width - footprint, position.x)
    } else {
        (work_area.y, work_area.height - footprint, position.y)
    };
    if span <= 0 {
        return 0.0;
    }
    ((coord - origin) as f64 / span as f64).clamp(0.0, 1.0)
}

fn finite_or_zero(value: f64, what: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(value = %value, component = what, "Non-finite geometry value, using 0");
        0.0
    }
}

fn to_pixel(value: f64, axis: &str) -> i32 {
    let value = finite_or_zero(value, axis).round();
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
