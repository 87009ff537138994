//! Geometry-level editing tool: anchors, curves and handles of one target.

use super::ToolTransition;
use crate::context::EditorContext;
use crate::error::EditResult;
use crate::hit_test::{Hit, HitKind, HitOptions};
use crate::input::{DoubleClickDetector, KeyCommand, PointerEvent, PointerKind};
use crate::scene::ItemId;
use crate::transform::TransformSession;

/// State of the edit tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// A drag session is open on anchors, a handle or the whole target.
    Dragging,
    /// Pressed on empty space; drags grow an anchor marquee.
    MarqueeActive,
}

/// Edits the segments of the current edit target.
#[derive(Debug, Clone, Default)]
pub struct EditTool {
    state: EditState,
    double_click: DoubleClickDetector,
}

impl EditTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn on_pointer(
        &mut self,
        ctx: &mut EditorContext,
        event: &PointerEvent,
    ) -> EditResult<ToolTransition> {
        let Some(target) = ctx.edit_target() else {
            return Ok(ToolTransition::ExitEditMode);
        };
        match event.kind {
            PointerKind::Down => self.on_down(ctx, target, event),
            PointerKind::Drag => {
                match self.state {
                    EditState::Dragging => {
                        ctx.apply_transform(event);
                    }
                    EditState::MarqueeActive => ctx.update_marquee(event.point)?,
                    EditState::Idle => {}
                }
                Ok(ToolTransition::Stay)
            }
            PointerKind::Up => {
                match self.state {
                    EditState::Dragging => {
                        if ctx.end_transform() {
                            ctx.save_snapshot("Edit geometry")?;
                        }
                    }
                    EditState::MarqueeActive => {
                        ctx.commit_marquee()?;
                    }
                    EditState::Idle => {}
                }
                self.state = EditState::Idle;
                Ok(ToolTransition::Stay)
            }
            PointerKind::DoubleClick => {
                self.reset(ctx);
                match ctx.hit_test_in(target, event.point, &HitOptions::default())? {
                    Some(_) => {
                        ctx.set_fully_selected(true);
                        Ok(ToolTransition::Stay)
                    }
                    None => Ok(ToolTransition::ExitEditMode),
                }
            }
            PointerKind::Move => Ok(ToolTransition::Stay),
        }
    }

    fn on_down(
        &mut self,
        ctx: &mut EditorContext,
        target: ItemId,
        event: &PointerEvent,
    ) -> EditResult<ToolTransition> {
        if self.state != EditState::Idle {
            log::warn!("Pointer down while {:?}, resetting", self.state);
            self.reset(ctx);
        }
        let shift = event.modifiers.shift;
        let Some(hit) = ctx.hit_test_in(target, event.point, &HitOptions::default())? else {
            self.double_click.reset();
            if !shift {
                ctx.clear_sub_selection();
            }
            ctx.begin_marquee(event.point)?;
            self.state = EditState::MarqueeActive;
            return Ok(ToolTransition::Stay);
        };

        let window = ctx.config().double_click_ms;
        let double = self.double_click.register(target, event.timestamp_ms, window);
        let session = match hit.kind {
            _ if double => self.grab_whole(ctx, target, event)?,
            HitKind::Fill | HitKind::Stroke => self.grab_whole(ctx, target, event)?,
            HitKind::Segment(index) => {
                if shift {
                    ctx.toggle_segment(hit.item, index)?;
                } else if !ctx.is_segment_selected(hit.item, index) {
                    ctx.clear_sub_selection();
                    ctx.select_segment(hit.item, index)?;
                }
                TransformSession::begin_segments(ctx.scene(), &ctx.selected_anchors(), event.point)
            }
            HitKind::Curve { index, .. } => {
                self.click_curve(ctx, &hit, index, shift)?;
                TransformSession::begin_segments(ctx.scene(), &ctx.selected_anchors(), event.point)
            }
            HitKind::HandleIn(_) | HitKind::HandleOut(_) => {
                let Some((index, side)) = hit.kind.handle() else {
                    return Ok(ToolTransition::Stay);
                };
                ctx.select_handle(hit.item, index, side)?;
                TransformSession::begin_handle(
                    ctx.scene(),
                    hit.item,
                    index,
                    side,
                    event.point,
                    ctx.config().colinear_tolerance,
                )
            }
        };
        if let Some(session) = session {
            ctx.begin_transform(session)?;
            self.state = EditState::Dragging;
        }
        Ok(ToolTransition::Stay)
    }

    fn grab_whole(
        &mut self,
        ctx: &mut EditorContext,
        target: ItemId,
        event: &PointerEvent,
    ) -> EditResult<Option<TransformSession>> {
        ctx.set_fully_selected(true);
        Ok(TransformSession::begin_items(ctx.scene(), &[target], event.point))
    }

    fn click_curve(
        &mut self,
        ctx: &mut EditorContext,
        hit: &Hit,
        index: usize,
        shift: bool,
    ) -> EditResult<()> {
        let selected = ctx.is_curve_selected(hit.item, index);
        if shift && selected {
            if let Some((from, to)) = ctx
                .scene()
                .path(hit.item)
                .and_then(|path| path.curve_endpoints(index))
            {
                ctx.deselect_segment(hit.item, from)?;
                ctx.deselect_segment(hit.item, to)?;
            }
        } else if shift || !selected {
            if !shift {
                ctx.clear_sub_selection();
            }
            ctx.select_curve(hit.item, index)?;
        }
        Ok(())
    }

    pub fn on_key(&mut self, ctx: &mut EditorContext, command: KeyCommand) -> EditResult<ToolTransition> {
        match command {
            KeyCommand::Cancel => {
                self.reset(ctx);
                ctx.clear_sub_selection();
            }
            KeyCommand::SelectAll => ctx.select_all_segments(),
            KeyCommand::Invert => ctx.invert_segment_selection(),
            KeyCommand::Delete => {
                self.reset(ctx);
                if ctx.selection().is_fully_selected() {
                    let Some(target) = ctx.edit_target() else {
                        return Ok(ToolTransition::ExitEditMode);
                    };
                    ctx.clear_edit_target();
                    ctx.deselect_all();
                    ctx.select_item(target)?;
                    ctx.delete_selected()?;
                    return Ok(ToolTransition::ExitEditMode);
                }
                ctx.delete_selected_segments()?;
                if ctx.edit_target().is_none() {
                    return Ok(ToolTransition::ExitEditMode);
                }
            }
            KeyCommand::Undo | KeyCommand::Redo => {}
        }
        Ok(ToolTransition::Stay)
    }

    /// Abandon any gesture in progress, restoring drag origins.
    pub fn reset(&mut self, ctx: &mut EditorContext) {
        match self.state {
            EditState::Dragging => ctx.cancel_transform(),
            EditState::MarqueeActive => {
                if let Err(err) = ctx.cancel_marquee() {
                    log::warn!("Failed to cancel marquee: {err}");
                }
            }
            EditState::Idle => {}
        }
        self.state = EditState::Idle;
        self.double_click.reset();
    }
}
