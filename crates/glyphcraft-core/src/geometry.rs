//! Small geometry helpers shared by hit-testing, marquee and drags.

use kurbo::{CubicBez, ParamCurveNearest, Point, Rect, Vec2};

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-6;

/// Quantize the direction of `delta` to the nearest multiple of `increment`
/// radians while keeping its length.
pub fn snap_delta(delta: Vec2, increment: f64) -> Vec2 {
    let length = delta.hypot();
    if length < f64::EPSILON || increment <= 0.0 {
        return delta;
    }
    let angle = delta.y.atan2(delta.x);
    let snapped = (angle / increment).round() * increment;
    Vec2::new(length * snapped.cos(), length * snapped.sin())
}

/// Whether two handles point in opposite directions within `tolerance`
/// radians. A zero-length handle is colinear with anything.
pub fn handles_colinear(handle_in: Vec2, handle_out: Vec2, tolerance: f64) -> bool {
    if handle_in.hypot2() < f64::EPSILON || handle_out.hypot2() < f64::EPSILON {
        return true;
    }
    let between = handle_in.cross(handle_out).abs().atan2(handle_in.dot(handle_out));
    std::f64::consts::PI - between <= tolerance
}

/// Rectangle spanned by two corners, with non-negative width and height.
pub fn normalized_rect(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Inclusive overlap test. Unlike `Rect::intersect(..).area() > 0`, this
/// also accepts degenerate rectangles such as the bounds of a straight line.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Inclusive point-in-rectangle test.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Parameter and distance of the point on `curve` nearest to `point`.
pub fn nearest_on_cubic(curve: CubicBez, point: Point) -> (f64, f64) {
    let nearest = curve.nearest(point, NEAREST_ACCURACY);
    (nearest.t, nearest.distance_sq.sqrt())
}
