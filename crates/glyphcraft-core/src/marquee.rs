//! Rectangle (marquee) selection.
//!
//! Without an edit target the marquee selects the selectable units (top-most
//! items below a layer) whose members touch the rectangle. With one, it
//! selects the target's anchors inside it. The rectangle is mirrored by a
//! hidden overlay item in the internal layer so a renderer can draw it like
//! any other geometry.

use crate::context::EditorContext;
use crate::error::{EditError, EditResult};
use crate::events::EditorEvent;
use crate::geometry::{normalized_rect, rect_contains, rects_overlap};
use crate::scene::{ItemId, ItemKind};
use kurbo::{Point, Rect};

/// Marquee bookkeeping owned by the editing context.
#[derive(Debug, Clone)]
pub struct MarqueeState {
    overlay: ItemId,
    drag: Option<(Point, Point)>,
}

impl MarqueeState {
    pub(crate) fn new(overlay: ItemId) -> Self {
        Self {
            overlay,
            drag: None,
        }
    }

    pub fn overlay(&self) -> ItemId {
        self.overlay
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    /// The normalized rectangle being dragged.
    pub fn rect(&self) -> Option<Rect> {
        self.drag.map(|(origin, current)| normalized_rect(origin, current))
    }
}

/// What a committed marquee selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarqueeOutcome {
    Items(Vec<ItemId>),
    Segments(usize),
}

impl EditorContext {
    fn marquee_state(&mut self) -> EditResult<&mut MarqueeState> {
        self.marquee
            .as_mut()
            .ok_or(EditError::NotInitialized("marquee"))
    }

    pub fn marquee(&self) -> Option<&MarqueeState> {
        self.marquee.as_ref()
    }

    /// Start a marquee at `point`.
    pub fn begin_marquee(&mut self, point: Point) -> EditResult<()> {
        self.marquee_state()?.drag = Some((point, point));
        self.sync_overlay(true);
        Ok(())
    }

    /// Move the free corner of the marquee.
    pub fn update_marquee(&mut self, point: Point) -> EditResult<()> {
        let state = self.marquee_state()?;
        match &mut state.drag {
            Some((_, current)) => *current = point,
            None => state.drag = Some((point, point)),
        }
        self.sync_overlay(true);
        Ok(())
    }

    /// Apply the marquee to the selection and hide it. Selection is additive;
    /// callers clear beforehand when they want replacement.
    pub fn commit_marquee(&mut self) -> EditResult<MarqueeOutcome> {
        let rect = self.marquee_state()?.drag.take().map(|(a, b)| normalized_rect(a, b));
        self.sync_overlay(false);
        let Some(rect) = rect else {
            return Ok(MarqueeOutcome::Items(Vec::new()));
        };
        let outcome = match self.edit_target() {
            Some(_) => MarqueeOutcome::Segments(self.select_anchors_in(rect)),
            None => MarqueeOutcome::Items(self.select_items_in(rect)?),
        };
        log::debug!("Marquee {rect:?} selected {outcome:?}");
        self.notify(EditorEvent::SelectionChanged);
        Ok(outcome)
    }

    /// Drop the marquee without touching the selection.
    pub fn cancel_marquee(&mut self) -> EditResult<()> {
        self.marquee_state()?.drag = None;
        self.sync_overlay(false);
        Ok(())
    }

    fn sync_overlay(&mut self, visible: bool) {
        let Some(state) = self.marquee.as_ref() else {
            return;
        };
        let overlay = state.overlay;
        let rect = state.rect();
        if let Some(item) = self.scene.get_mut(overlay) {
            item.visible = visible && rect.is_some();
            if let (ItemKind::Shape(shape), Some(rect)) = (&mut item.kind, rect) {
                shape.frame = rect;
            }
        }
    }

    /// Items touching `rect`, resolved to their selectable unit the same way
    /// a click is, so a group is selected rather than its members.
    fn select_items_in(&mut self, rect: Rect) -> EditResult<Vec<ItemId>> {
        let mut hits: Vec<ItemId> = Vec::new();
        for id in self.scene.paint_order() {
            let touches = self.scene.get(id).is_some_and(|item| !item.kind.is_layer())
                && self.scene.is_visible(id)
                && !self.scene.is_locked(id)
                && !self.scene.is_internal(id)
                && self
                    .scene
                    .bounds(id)
                    .is_some_and(|bounds| rects_overlap(bounds, rect));
            let unit = self.scene.selectable_unit(id);
            if touches && !hits.contains(&unit) {
                hits.push(unit);
            }
        }
        for &id in &hits {
            self.add_to_selection(id)?;
        }
        Ok(hits)
    }

    fn select_anchors_in(&mut self, rect: Rect) -> usize {
        let mut count = 0;
        for path_id in self.edit_paths() {
            if let Some(path) = self.scene.path_mut(path_id) {
                for segment in &mut path.segments {
                    if rect_contains(rect, segment.point) {
                        segment.selected = true;
                        count += 1;
                    }
                }
            }
        }
        count
    }
}
