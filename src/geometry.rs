use serde::{Deserialize, Serialize};

use crate::config::{CanvasConfig, CurveConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise `self - other`.
    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Axis-aligned node box with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeRect {
    pub fn at(origin: Point, canvas: &CanvasConfig) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: canvas.node_width,
            height: canvas.node_height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Outgoing edges attach at the right edge, vertical midpoint.
    pub fn source_anchor(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height / 2.0)
    }

    /// Incoming edges attach at the left edge, vertical midpoint.
    pub fn target_anchor(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    /// True when `point` lies on the output port strip hugging the right edge.
    pub fn port_contains(&self, point: Point, port_width: f32) -> bool {
        let half = port_width / 2.0;
        point.x >= self.x + self.width - half
            && point.x <= self.x + self.width + half
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Cubic Bézier from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePath {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CurvePath {
    pub fn to_svg_d(&self) -> String {
        format!(
            "M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }
}

/// Horizontal control-point distance for a curve spanning `dx`.
pub fn control_offset(dx: f32, config: &CurveConfig) -> f32 {
    (dx.abs() * config.control_ratio).max(config.min_control_offset)
}

/// S-curve from a source anchor `(x1, y1)` to a target anchor `(x2, y2)`.
/// The first control point sits to the right of the source and the second
/// to the left of the target, so the curve leaves and enters horizontally
/// even when the target lies left of the source.
pub fn curve_path(x1: f32, y1: f32, x2: f32, y2: f32, config: &CurveConfig) -> CurvePath {
    let offset = control_offset(x2 - x1, config);
    CurvePath {
        start: Point::new(x1, y1),
        control1: Point::new(x1 + offset, y1),
        control2: Point::new(x2 - offset, y2),
        end: Point::new(x2, y2),
    }
}

pub fn edge_path(from: &NodeRect, to: &NodeRect, config: &CurveConfig) -> CurvePath {
    let start = from.source_anchor();
    let end = to.target_anchor();
    curve_path(start.x, start.y, end.x, end.y, config)
}

/// Rubber-band curve drawn while a connect gesture is in flight.
pub fn preview_path(from: &NodeRect, pointer: Point, config: &CurveConfig) -> CurvePath {
    let start = from.source_anchor();
    curve_path(start.x, start.y, pointer.x, pointer.y, config)
}

/// Where an edge label sits: the endpoints' midpoint, lifted by the clearance.
pub fn label_anchor(start: Point, end: Point, clearance: f32) -> Point {
    let mid = start.midpoint(end);
    Point::new(mid.x, mid.y - clearance)
}

/// Clamps a node origin so its box stays inside the viewport, honouring the
/// minimum margin on every side.
pub fn clamp_node_origin(point: Point, canvas: &CanvasConfig) -> Point {
    Point::new(
        clamp_axis(point.x, canvas.viewport_width, canvas.node_width, canvas.min_margin),
        clamp_axis(point.y, canvas.viewport_height, canvas.node_height, canvas.min_margin),
    )
}

fn clamp_axis(value: f32, viewport: f32, node: f32, margin: f32) -> f32 {
    let lo = margin;
    // Viewports smaller than a node pin it at the margin.
    let hi = (viewport - node - margin).max(lo);
    if value.is_nan() {
        return lo;
    }
    value.clamp(lo, hi)
}
