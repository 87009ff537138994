//! Classify what lies under a point.
//!
//! Items are visited front to back and the first one with any match wins.
//! Within that item classifications are tried in priority order: anchors,
//! then handles, then curves/strokes, then fills.

use crate::geometry::nearest_on_cubic;
use crate::scene::{
    FillRule, HandleSide, ItemId, ItemKind, PathGeometry, SceneGraph, ShapeGeometry,
};
use kurbo::{BezPath, ParamCurve, ParamCurveNearest, Point, Shape};

/// Accuracy for nearest-point queries on primitive outlines.
const OUTLINE_ACCURACY: f64 = 1e-6;

/// Which classifications a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOptions {
    pub segments: bool,
    pub handles: bool,
    pub curves: bool,
    pub stroke: bool,
    pub fill: bool,
    /// Also consider items flagged as guides.
    pub guides: bool,
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            segments: true,
            handles: true,
            curves: true,
            stroke: true,
            fill: true,
            guides: false,
        }
    }
}

/// How the pointer relates to the hit item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitKind {
    Fill,
    Segment(usize),
    HandleIn(usize),
    HandleOut(usize),
    /// On curve `index` (from segment `index` to the next) at parameter `t`.
    Curve { index: usize, t: f64 },
    /// On the outline of a primitive shape.
    Stroke,
}

impl HitKind {
    pub fn handle(&self) -> Option<(usize, HandleSide)> {
        match *self {
            HitKind::HandleIn(index) => Some((index, HandleSide::In)),
            HitKind::HandleOut(index) => Some((index, HandleSide::Out)),
            _ => None,
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The leaf that produced the hit; a compound path for compound fills.
    pub item: ItemId,
    pub kind: HitKind,
    /// The matched location (anchor, handle tip, point on curve, or the query).
    pub location: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Segment,
    Handle,
    Curve,
    Fill,
}

const TIERS: [Tier; 4] = [Tier::Segment, Tier::Handle, Tier::Curve, Tier::Fill];

/// Hit-test the whole scene.
pub fn hit_test(
    scene: &SceneGraph,
    point: Point,
    tolerance: f64,
    options: &HitOptions,
) -> Option<Hit> {
    let mut candidates = scene.paint_order();
    candidates.reverse();
    run(scene, &candidates, point, tolerance, options)
}

/// Hit-test only within the subtree rooted at `root`.
pub fn hit_test_item(
    scene: &SceneGraph,
    root: ItemId,
    point: Point,
    tolerance: f64,
    options: &HitOptions,
) -> Option<Hit> {
    if !scene.contains(root) {
        return None;
    }
    let mut candidates = vec![root];
    candidates.extend(scene.descendants(root));
    candidates.reverse();
    run(scene, &candidates, point, tolerance, options)
}

fn run(
    scene: &SceneGraph,
    front_to_back: &[ItemId],
    point: Point,
    tolerance: f64,
    options: &HitOptions,
) -> Option<Hit> {
    front_to_back
        .iter()
        .copied()
        .filter(|&id| is_eligible(scene, id, options))
        .find_map(|id| {
            TIERS
                .iter()
                .find_map(|&tier| test_tier(scene, id, tier, point, tolerance, options))
        })
}

fn is_eligible(scene: &SceneGraph, id: ItemId, options: &HitOptions) -> bool {
    if !scene.is_visible(id) || scene.is_locked(id) || scene.is_internal(id) {
        return false;
    }
    let is_guide = std::iter::once(id)
        .chain(scene.ancestors(id))
        .any(|candidate| scene.get(candidate).is_some_and(|item| item.guide));
    options.guides || !is_guide
}

fn test_tier(
    scene: &SceneGraph,
    id: ItemId,
    tier: Tier,
    point: Point,
    tolerance: f64,
    options: &HitOptions,
) -> Option<Hit> {
    let item = scene.get(id)?;
    let kind = match (&item.kind, tier) {
        (ItemKind::Path(path), Tier::Segment) if options.segments => {
            segment_hit(path, point, tolerance)
        }
        (ItemKind::Path(path), Tier::Handle) if options.handles => {
            handle_hit(path, point, tolerance)
        }
        (ItemKind::Path(path), Tier::Curve) => {
            if options.curves {
                curve_hit(path, point, tolerance)
            } else if options.stroke && path.style.stroke.is_some() {
                curve_hit(path, point, tolerance).map(|(_, location)| (HitKind::Stroke, location))
            } else {
                None
            }
        }
        (ItemKind::Path(path), Tier::Fill) if options.fill && path.style.fill.is_some() => {
            let mut outline = BezPath::new();
            append_closed(path, &mut outline);
            fill_hit(&outline, FillRule::NonZero, point)
        }
        (ItemKind::Shape(shape), Tier::Curve) if options.stroke && shape.style.stroke.is_some() => {
            stroke_hit(shape, point, tolerance)
        }
        (ItemKind::Shape(shape), Tier::Fill) if options.fill && shape.style.fill.is_some() => {
            fill_hit(&shape.to_bez_path(), FillRule::NonZero, point)
        }
        (ItemKind::CompoundPath(compound), Tier::Fill)
            if options.fill && compound.style.fill.is_some() =>
        {
            let mut outline = BezPath::new();
            for &child in scene.children(id) {
                if let Some(path) = scene.path(child) {
                    append_closed(path, &mut outline);
                }
            }
            fill_hit(&outline, compound.fill_rule, point)
        }
        _ => None,
    }?;
    Some(Hit {
        item: id,
        kind: kind.0,
        location: kind.1,
    })
}

fn segment_hit(path: &PathGeometry, point: Point, tolerance: f64) -> Option<(HitKind, Point)> {
    path.segments
        .iter()
        .enumerate()
        .map(|(index, segment)| (index, segment.point, segment.point.distance(point)))
        .filter(|&(_, _, distance)| distance <= tolerance)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(index, anchor, _)| (HitKind::Segment(index), anchor))
}

/// Handles are only live on selected segments, and zero-length ones are
/// hidden under their anchor.
fn handle_hit(path: &PathGeometry, point: Point, tolerance: f64) -> Option<(HitKind, Point)> {
    path.segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.selected)
        .flat_map(|(index, segment)| {
            [HandleSide::In, HandleSide::Out]
                .into_iter()
                .filter(|&side| segment.handle(side).hypot2() > 0.0)
                .map(move |side| (index, side, segment.handle_point(side)))
        })
        .map(|(index, side, tip)| (index, side, tip, tip.distance(point)))
        .filter(|&(.., distance)| distance <= tolerance)
        .min_by(|a, b| a.3.total_cmp(&b.3))
        .map(|(index, side, tip, _)| {
            let kind = match side {
                HandleSide::In => HitKind::HandleIn(index),
                HandleSide::Out => HitKind::HandleOut(index),
            };
            (kind, tip)
        })
}

fn curve_hit(path: &PathGeometry, point: Point, tolerance: f64) -> Option<(HitKind, Point)> {
    path.curves()
        .map(|(index, curve)| {
            let (t, distance) = nearest_on_cubic(curve, point);
            (index, t, curve.eval(t), distance)
        })
        .filter(|&(.., distance)| distance <= tolerance)
        .min_by(|a, b| a.3.total_cmp(&b.3))
        .map(|(index, t, location, _)| (HitKind::Curve { index, t }, location))
}

fn stroke_hit(shape: &ShapeGeometry, point: Point, tolerance: f64) -> Option<(HitKind, Point)> {
    let reach = tolerance + shape.style.stroke_width / 2.0;
    shape
        .to_bez_path()
        .segments()
        .map(|segment| segment.nearest(point, OUTLINE_ACCURACY).distance_sq.sqrt())
        .any(|distance| distance <= reach)
        .then_some((HitKind::Stroke, point))
}

fn fill_hit(outline: &BezPath, rule: FillRule, point: Point) -> Option<(HitKind, Point)> {
    rule.is_inside(outline.winding(point))
        .then_some((HitKind::Fill, point))
}

/// Append a path, implicitly closing it so open paths still have an interior.
fn append_closed(path: &PathGeometry, outline: &mut BezPath) {
    if path.is_empty() {
        return;
    }
    path.append_to(outline);
    if !path.closed {
        outline.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        CompoundGeometry, ItemStyle, Segment, SerializableColor,
    };
    use kurbo::{Rect, Vec2};

    fn red() -> ItemStyle {
        ItemStyle::filled(SerializableColor::new(255, 0, 0, 255))
    }

    fn square(x: f64, y: f64, size: f64) -> PathGeometry {
        PathGeometry::from_points(
            &[
                Point::new(x, y),
                Point::new(x + size, y),
                Point::new(x + size, y + size),
                Point::new(x, y + size),
            ],
            true,
        )
    }

    fn scene_with(paths: Vec<PathGeometry>) -> (SceneGraph, Vec<ItemId>) {
        let mut scene = SceneGraph::new();
        let layer = scene.add_layer("Layer 1");
        let ids = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                scene
                    .insert(Some(layer), format!("p{i}"), ItemKind::Path(path))
                    .unwrap()
            })
            .collect();
        (scene, ids)
    }

    #[test]
    fn test_miss_returns_none() {
        let (scene, _) = scene_with(vec![square(0.0, 0.0, 10.0).with_style(red())]);
        assert!(hit_test(&scene, Point::new(100.0, 100.0), 4.0, &HitOptions::default()).is_none());
    }

    #[test]
    fn test_front_fill_beats_outline_behind() {
        let (scene, ids) = scene_with(vec![
            square(40.0, 40.0, 20.0),
            square(0.0, 0.0, 100.0).with_style(red()),
        ]);
        let hit = hit_test(&scene, Point::new(50.0, 41.0), 4.0, &HitOptions::default()).unwrap();
        assert_eq!(hit.item, ids[1]);
        assert_eq!(hit.kind, HitKind::Fill);

        let anchor = hit_test(&scene, Point::new(41.0, 40.0), 4.0, &HitOptions::default()).unwrap();
        assert_eq!(anchor.item, ids[1]);
    }

    #[test]
    fn test_segment_beats_fill_of_same_item() {
        let (scene, ids) = scene_with(vec![square(0.0, 0.0, 100.0).with_style(red())]);
        let hit = hit_test(&scene, Point::new(2.0, 2.0), 4.0, &HitOptions::default()).unwrap();
        assert_eq!(hit.item, ids[0]);
        assert_eq!(hit.kind, HitKind::Segment(0));
        assert_eq!(hit.location, Point::ZERO);
    }

    #[test]
    fn test_back_item_reachable_outside_front() {
        let (scene, ids) = scene_with(vec![
            square(0.0, 0.0, 100.0).with_style(red()),
            square(50.0, 50.0, 20.0).with_style(red()),
        ]);
        let hit = hit_test(&scene, Point::new(10.0, 50.0), 4.0, &HitOptions::default()).unwrap();
        assert_eq!((hit.item, hit.kind), (ids[0], HitKind::Fill));
    }

    #[test]
    fn test_topmost_of_identical_items_wins() {
        let (scene, ids) = scene_with(vec![
            square(0.0, 0.0, 10.0).with_style(red()),
            square(0.0, 0.0, 10.0).with_style(red()),
        ]);
        let hit = hit_test(&scene, Point::new(5.0, 5.0), 1.0, &HitOptions::default()).unwrap();
        assert_eq!(hit.item, ids[1]);
        assert_eq!(hit.kind, HitKind::Fill);
    }

    #[test]
    fn test_curve_hit_reports_parameter() {
        let (scene, ids) = scene_with(vec![square(0.0, 0.0, 100.0)]);
        let hit = hit_test(&scene, Point::new(50.0, 2.0), 4.0, &HitOptions::default()).unwrap();
        assert_eq!(hit.item, ids[0]);
        match hit.kind {
            HitKind::Curve { index, t } => {
                assert_eq!(index, 0);
                assert!((t - 0.5).abs() < 1e-3);
            }
            other => panic!("expected curve hit, got {other:?}"),
        }
    }

    #[test]
    fn test_unfilled_interior_misses() {
        let (scene, _) = scene_with(vec![square(0.0, 0.0, 100.0)]);
        assert!(hit_test(&scene, Point::new(50.0, 50.0), 4.0, &HitOptions::default()).is_none());
    }

    #[test]
    fn test_handles_only_on_selected_segments() {
        let path = PathGeometry::new(
            vec![
                Segment::with_handles(Point::ZERO, Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0)),
                Segment::new(Point::new(100.0, 100.0)),
            ],
            false,
        );
        let (mut scene, ids) = scene_with(vec![path]);
        let tip = Point::new(-20.0, 0.0);
        assert!(hit_test(&scene, tip, 2.0, &HitOptions::default()).is_none());

        scene.path_mut(ids[0]).unwrap().segments[0].selected = true;
        let hit = hit_test(&scene, tip, 2.0, &HitOptions::default()).unwrap();
        assert_eq!(hit.kind, HitKind::HandleIn(0));
        assert_eq!(hit.kind.handle(), Some((0, HandleSide::In)));
    }

    #[test]
    fn test_hidden_and_internal_skipped() {
        let (mut scene, ids) = scene_with(vec![square(0.0, 0.0, 10.0).with_style(red())]);
        scene.get_mut(ids[0]).unwrap().visible = false;
        assert!(hit_test(&scene, Point::new(5.0, 5.0), 1.0, &HitOptions::default()).is_none());

        scene.get_mut(ids[0]).unwrap().visible = true;
        scene.get_mut(ids[0]).unwrap().name = "__overlay".to_string();
        assert!(hit_test(&scene, Point::new(5.0, 5.0), 1.0, &HitOptions::default()).is_none());
    }

    #[test]
    fn test_guides_need_option() {
        let (mut scene, ids) = scene_with(vec![square(0.0, 0.0, 10.0)]);
        scene.get_mut(ids[0]).unwrap().guide = true;
        assert!(hit_test(&scene, Point::ZERO, 1.0, &HitOptions::default()).is_none());
        let options = HitOptions {
            guides: true,
            ..HitOptions::default()
        };
        assert!(hit_test(&scene, Point::ZERO, 1.0, &options).is_some());
    }

    #[test]
    fn test_compound_even_odd_hole() {
        let mut scene = SceneGraph::new();
        let layer = scene.add_layer("Layer 1");
        let compound = scene
            .insert(
                Some(layer),
                "o",
                ItemKind::CompoundPath(CompoundGeometry {
                    fill_rule: FillRule::EvenOdd,
                    style: red(),
                }),
            )
            .unwrap();
        scene
            .insert(Some(compound), "outer", ItemKind::Path(square(0.0, 0.0, 100.0)))
            .unwrap();
        scene
            .insert(Some(compound), "inner", ItemKind::Path(square(25.0, 25.0, 50.0)))
            .unwrap();

        let ring = hit_test(&scene, Point::new(10.0, 50.0), 1.0, &HitOptions::default()).unwrap();
        assert_eq!(ring.item, compound);
        assert_eq!(ring.kind, HitKind::Fill);
        assert!(hit_test(&scene, Point::new(50.0, 50.0), 1.0, &HitOptions::default()).is_none());
    }

    #[test]
    fn test_shape_stroke_and_fill() {
        let mut scene = SceneGraph::new();
        let layer = scene.add_layer("Layer 1");
        let shape = scene
            .insert(
                Some(layer),
                "box",
                ItemKind::Shape(
                    ShapeGeometry::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)).with_style(red()),
                ),
            )
            .unwrap();
        let edge = hit_test(&scene, Point::new(20.0, 1.0), 2.0, &HitOptions::default()).unwrap();
        assert_eq!((edge.item, edge.kind), (shape, HitKind::Stroke));
        let inside = hit_test(&scene, Point::new(20.0, 20.0), 2.0, &HitOptions::default()).unwrap();
        assert_eq!(inside.kind, HitKind::Fill);
    }

    #[test]
    fn test_restricted_to_subtree() {
        let (scene, ids) = scene_with(vec![
            square(0.0, 0.0, 10.0).with_style(red()),
            square(0.0, 0.0, 10.0).with_style(red()),
        ]);
        let hit = hit_test_item(&scene, ids[0], Point::new(5.0, 5.0), 1.0, &HitOptions::default())
            .unwrap();
        assert_eq!(hit.item, ids[0]);
    }

    #[test]
    fn test_deterministic() {
        let (scene, _) = scene_with(vec![
            square(0.0, 0.0, 10.0).with_style(red()),
            square(5.0, 5.0, 10.0).with_style(red()),
        ]);
        let point = Point::new(7.0, 7.0);
        let first = hit_test(&scene, point, 4.0, &HitOptions::default());
        for _ in 0..10 {
            assert_eq!(hit_test(&scene, point, 4.0, &HitOptions::default()), first);
        }
    }
}
