//! Bezier path geometry: segments, open/closed paths and compound fill rules.

use super::ItemStyle;
use kurbo::{Affine, BezPath, CubicBez, ParamCurveExtrema, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Which of a segment's two handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandleSide {
    In,
    Out,
}

impl HandleSide {
    pub fn opposite(self) -> Self {
        match self {
            HandleSide::In => HandleSide::Out,
            HandleSide::Out => HandleSide::In,
        }
    }
}

/// An anchor point with its incoming and outgoing handles.
///
/// Handles are stored relative to the anchor. `selected` is transient edit
/// state and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub point: Point,
    #[serde(default)]
    pub handle_in: Vec2,
    #[serde(default)]
    pub handle_out: Vec2,
    #[serde(skip)]
    pub selected: bool,
}

impl Segment {
    /// A corner segment with zero-length handles.
    pub fn new(point: Point) -> Self {
        Self::with_handles(point, Vec2::ZERO, Vec2::ZERO)
    }

    pub fn with_handles(point: Point, handle_in: Vec2, handle_out: Vec2) -> Self {
        Self {
            point,
            handle_in,
            handle_out,
            selected: false,
        }
    }

    pub fn handle(&self, side: HandleSide) -> Vec2 {
        match side {
            HandleSide::In => self.handle_in,
            HandleSide::Out => self.handle_out,
        }
    }

    pub fn set_handle(&mut self, side: HandleSide, value: Vec2) {
        match side {
            HandleSide::In => self.handle_in = value,
            HandleSide::Out => self.handle_out = value,
        }
    }

    /// Absolute position of a handle's tip.
    pub fn handle_point(&self, side: HandleSide) -> Point {
        self.point + self.handle(side)
    }

    /// Both handles are zero-length.
    pub fn is_corner(&self) -> bool {
        self.handle_in == Vec2::ZERO && self.handle_out == Vec2::ZERO
    }

    fn transform(&mut self, affine: Affine) {
        let point = affine * self.point;
        self.handle_in = (affine * (self.point + self.handle_in)) - point;
        self.handle_out = (affine * (self.point + self.handle_out)) - point;
        self.point = point;
    }
}

/// How overlapping regions of a compound path are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    /// Whether a winding number counts as inside.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

/// An ordered run of segments, open or closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub style: ItemStyle,
}

impl PathGeometry {
    pub fn new(segments: Vec<Segment>, closed: bool) -> Self {
        Self {
            segments,
            closed,
            style: ItemStyle::default(),
        }
    }

    /// A polyline or polygon through the given corner points.
    pub fn from_points(points: &[Point], closed: bool) -> Self {
        Self::new(points.iter().copied().map(Segment::new).collect(), closed)
    }

    pub fn with_style(mut self, style: ItemStyle) -> Self {
        self.style = style;
        self
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of curves: one between each pair of neighbouring segments, plus
    /// the closing curve when the path is closed.
    pub fn curve_count(&self) -> usize {
        match self.segments.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// The cubic running from segment `index` to the next one.
    pub fn curve(&self, index: usize) -> Option<CubicBez> {
        if index >= self.curve_count() {
            return None;
        }
        let from = &self.segments[index];
        let to = &self.segments[(index + 1) % self.segments.len()];
        Some(CubicBez::new(
            from.point,
            from.handle_point(HandleSide::Out),
            to.handle_point(HandleSide::In),
            to.point,
        ))
    }

    pub fn curves(&self) -> impl Iterator<Item = (usize, CubicBez)> + '_ {
        (0..self.curve_count()).filter_map(|index| self.curve(index).map(|c| (index, c)))
    }

    /// Indices of the two segments bounding curve `index`.
    pub fn curve_endpoints(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.curve_count()).then(|| (index, (index + 1) % self.segments.len()))
    }

    /// Append this path's outline to `path`.
    pub fn append_to(&self, path: &mut BezPath) {
        let Some(first) = self.segments.first() else {
            return;
        };
        path.move_to(first.point);
        for (_, curve) in self.curves() {
            path.curve_to(curve.p1, curve.p2, curve.p3);
        }
        if self.closed {
            path.close_path();
        }
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path);
        path
    }

    /// Tight bounds of the outline, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.segments.first()?;
        let start = Rect::from_points(first.point, first.point);
        Some(
            self.curves()
                .fold(start, |acc, (_, curve)| acc.union(curve.bounding_box())),
        )
    }

    pub fn translate(&mut self, offset: Vec2) {
        for segment in &mut self.segments {
            segment.point += offset;
        }
    }

    pub fn transform(&mut self, affine: Affine) {
        for segment in &mut self.segments {
            segment.transform(affine);
        }
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| segment.selected.then_some(index))
            .collect()
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for segment in &mut self.segments {
            segment.selected = selected;
        }
    }

    pub fn all_selected(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| s.selected)
    }

    /// Remove every selected segment, returning how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.segments.len();
        self.segments.retain(|segment| !segment.selected);
        if self.segments.len() < 3 {
            self.closed = false;
        }
        before - self.segments.len()
    }
}

/// Attributes of a compound path; its sub-paths are its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundGeometry {
    #[serde(default)]
    pub fill_rule: FillRule,
    #[serde(default)]
    pub style: ItemStyle,
}

impl CompoundGeometry {
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            fill_rule,
            style: ItemStyle::default(),
        }
    }
}
