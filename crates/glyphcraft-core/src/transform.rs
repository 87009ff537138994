//! Drag sessions: moving items, anchors and bezier handles.
//!
//! A session records origins when the drag starts so that angle snapping can
//! be computed from the grab point and so that a cancel can put everything
//! back. Sessions never touch history.

use crate::config::EditorConfig;
use crate::geometry::{handles_colinear, snap_delta};
use crate::input::PointerEvent;
use crate::scene::{HandleSide, ItemId, ItemKind, SceneGraph};
use kurbo::{Point, Vec2};

#[derive(Debug, Clone)]
enum DragTarget {
    /// Whole items; originals cover each item and its descendants.
    Items {
        roots: Vec<ItemId>,
        originals: Vec<(ItemId, ItemKind)>,
    },
    /// Anchor points of path segments.
    Segments { origins: Vec<(ItemId, usize, Point)> },
    /// One handle, with its opposite when the pair starts out colinear.
    Handle {
        item: ItemId,
        index: usize,
        side: HandleSide,
        origin: Vec2,
        opposite_origin: Vec2,
        colinear: bool,
    },
}

/// State of one pointer drag, from press to release.
#[derive(Debug, Clone)]
pub struct TransformSession {
    grab: Point,
    target: DragTarget,
    moved: bool,
}

impl TransformSession {
    /// Start dragging whole items. Items whose ancestor is also listed are
    /// skipped, since moving the ancestor already carries them.
    pub fn begin_items(scene: &SceneGraph, ids: &[ItemId], grab: Point) -> Option<Self> {
        let roots: Vec<ItemId> = scene
            .top_level_of(ids)
            .into_iter()
            .filter(|&id| scene.get(id).is_some_and(|item| !item.kind.is_layer()))
            .collect();
        if roots.is_empty() {
            return None;
        }
        let originals = roots
            .iter()
            .flat_map(|&root| std::iter::once(root).chain(scene.descendants(root)))
            .filter_map(|id| scene.get(id).map(|item| (id, item.kind.clone())))
            .collect();
        log::debug!("Begin item drag of {} item(s)", roots.len());
        Some(Self {
            grab,
            target: DragTarget::Items { roots, originals },
            moved: false,
        })
    }

    /// Start dragging anchors. References to missing paths or segments are
    /// dropped; `None` when nothing valid remains.
    pub fn begin_segments(
        scene: &SceneGraph,
        refs: &[(ItemId, usize)],
        grab: Point,
    ) -> Option<Self> {
        let origins: Vec<(ItemId, usize, Point)> = refs
            .iter()
            .filter_map(|&(item, index)| {
                let segment = scene.path(item)?.segments.get(index)?;
                Some((item, index, segment.point))
            })
            .collect();
        if origins.is_empty() {
            return None;
        }
        log::debug!("Begin segment drag of {} anchor(s)", origins.len());
        Some(Self {
            grab,
            target: DragTarget::Segments { origins },
            moved: false,
        })
    }

    /// Start dragging one handle. Whether its opposite follows is decided
    /// here, from the handles as they are before the drag.
    pub fn begin_handle(
        scene: &SceneGraph,
        item: ItemId,
        index: usize,
        side: HandleSide,
        grab: Point,
        colinear_tolerance: f64,
    ) -> Option<Self> {
        let segment = scene.path(item)?.segments.get(index)?;
        let origin = segment.handle(side);
        let opposite_origin = segment.handle(side.opposite());
        let colinear = handles_colinear(origin, opposite_origin, colinear_tolerance);
        log::debug!("Begin handle drag on {item}[{index}] {side:?}, colinear={colinear}");
        Some(Self {
            grab,
            target: DragTarget::Handle {
                item,
                index,
                side,
                origin,
                opposite_origin,
                colinear,
            },
            moved: false,
        })
    }

    pub fn grab(&self) -> Point {
        self.grab
    }

    /// Whether any geometry changed during the session.
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn is_item_drag(&self) -> bool {
        matches!(self.target, DragTarget::Items { .. })
    }

    /// Apply one drag event. Shift snaps the total displacement from the
    /// grab point to the configured angle; otherwise the event's incremental
    /// delta is added. Returns whether geometry changed.
    pub fn apply(&mut self, scene: &mut SceneGraph, event: &PointerEvent, config: &EditorConfig) -> bool {
        let snapped = event
            .modifiers
            .shift
            .then(|| snap_delta(event.point - self.grab, config.snap_angle));
        let changed = match &self.target {
            DragTarget::Items { roots, originals } => {
                match snapped {
                    Some(offset) => {
                        restore_kinds(scene, originals);
                        translate_all(scene, roots, offset);
                    }
                    None => translate_all(scene, roots, event.delta),
                }
                snapped.is_some() || event.delta != Vec2::ZERO
            }
            DragTarget::Segments { origins } => {
                let mut changed = false;
                for &(item, index, origin) in origins {
                    let Some(segment) = scene
                        .path_mut(item)
                        .and_then(|path| path.segments.get_mut(index))
                    else {
                        continue;
                    };
                    let next = match snapped {
                        Some(offset) => origin + offset,
                        None => segment.point + event.delta,
                    };
                    changed |= next != segment.point;
                    segment.point = next;
                }
                changed
            }
            DragTarget::Handle {
                item,
                index,
                side,
                origin,
                colinear,
                ..
            } => {
                let Some(segment) = scene
                    .path_mut(*item)
                    .and_then(|path| path.segments.get_mut(*index))
                else {
                    return false;
                };
                let current = segment.handle(*side);
                let next = match snapped {
                    Some(offset) => *origin + offset,
                    None => current + event.delta,
                };
                let delta = next - current;
                segment.set_handle(*side, next);
                // Smooth anchors keep the opposite handle as the exact mirror.
                if *colinear && !event.modifiers.alt {
                    segment.set_handle(side.opposite(), -next);
                }
                delta != Vec2::ZERO
            }
        };
        self.moved |= changed;
        changed
    }

    /// Put every touched value back to its origin.
    pub fn cancel(&self, scene: &mut SceneGraph) {
        log::debug!("Cancel drag");
        match &self.target {
            DragTarget::Items { originals, .. } => restore_kinds(scene, originals),
            DragTarget::Segments { origins } => {
                for &(item, index, origin) in origins {
                    if let Some(segment) = scene
                        .path_mut(item)
                        .and_then(|path| path.segments.get_mut(index))
                    {
                        segment.point = origin;
                    }
                }
            }
            DragTarget::Handle {
                item,
                index,
                side,
                origin,
                opposite_origin,
                ..
            } => {
                if let Some(segment) = scene
                    .path_mut(*item)
                    .and_then(|path| path.segments.get_mut(*index))
                {
                    segment.set_handle(*side, *origin);
                    segment.set_handle(side.opposite(), *opposite_origin);
                }
            }
        }
    }

    /// Finish the session, reporting whether it moved anything.
    pub fn end(self) -> bool {
        log::debug!("End drag, moved={}", self.moved);
        self.moved
    }
}

fn restore_kinds(scene: &mut SceneGraph, originals: &[(ItemId, ItemKind)]) {
    for (id, kind) in originals {
        if let Some(item) = scene.get_mut(*id) {
            item.kind = kind.clone();
        }
    }
}

fn translate_all(scene: &mut SceneGraph, roots: &[ItemId], offset: Vec2) {
    for &root in roots {
        if let Err(err) = scene.translate(root, offset) {
            log::warn!("Skipping drag of stale item: {err}");
        }
    }
}
