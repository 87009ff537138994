//! Object-level selection tool.

use super::ToolTransition;
use crate::context::EditorContext;
use crate::error::EditResult;
use crate::hit_test::HitOptions;
use crate::input::{DoubleClickDetector, KeyCommand, PointerEvent, PointerKind};
use crate::scene::ItemId;
use crate::transform::TransformSession;
use kurbo::Point;

/// State of the select tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectState {
    #[default]
    Idle,
    /// Pressed on an item; drags move the selection.
    ItemSelectedArmed,
    /// Pressed on empty canvas; drags grow a marquee.
    MarqueeActive,
}

/// Selects and moves whole items.
#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    state: SelectState,
    double_click: DoubleClickDetector,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectState {
        self.state
    }

    pub fn on_pointer(
        &mut self,
        ctx: &mut EditorContext,
        event: &PointerEvent,
    ) -> EditResult<ToolTransition> {
        match event.kind {
            PointerKind::Down => self.on_down(ctx, event),
            PointerKind::Drag => {
                match self.state {
                    SelectState::ItemSelectedArmed => {
                        ctx.apply_transform(event);
                    }
                    SelectState::MarqueeActive => ctx.update_marquee(event.point)?,
                    SelectState::Idle => {}
                }
                Ok(ToolTransition::Stay)
            }
            PointerKind::Up => {
                match self.state {
                    SelectState::ItemSelectedArmed => {
                        if ctx.end_transform() {
                            ctx.save_snapshot("Move items")?;
                        }
                    }
                    SelectState::MarqueeActive => {
                        ctx.commit_marquee()?;
                    }
                    SelectState::Idle => {}
                }
                self.state = SelectState::Idle;
                Ok(ToolTransition::Stay)
            }
            PointerKind::DoubleClick => {
                self.reset(ctx);
                Ok(self
                    .editable_unit_at(ctx, event.point)?
                    .map_or(ToolTransition::Stay, ToolTransition::EnterEditMode))
            }
            PointerKind::Move => Ok(ToolTransition::Stay),
        }
    }

    fn on_down(&mut self, ctx: &mut EditorContext, event: &PointerEvent) -> EditResult<ToolTransition> {
        if self.state != SelectState::Idle {
            log::warn!("Pointer down while {:?}, resetting", self.state);
            self.reset(ctx);
        }
        let hit = ctx.hit_test(event.point, &HitOptions::default())?;
        let Some(hit) = hit else {
            self.double_click.reset();
            if !event.modifiers.shift {
                ctx.deselect_all();
            }
            ctx.begin_marquee(event.point)?;
            self.state = SelectState::MarqueeActive;
            return Ok(ToolTransition::Stay);
        };

        let unit = ctx.scene().selectable_unit(hit.item);
        let window = ctx.config().double_click_ms;
        if self.double_click.register(unit, event.timestamp_ms, window)
            && ctx.scene().has_path_geometry(unit)
        {
            return Ok(ToolTransition::EnterEditMode(unit));
        }

        if event.modifiers.shift {
            if !ctx.toggle_item(unit)? {
                return Ok(ToolTransition::Stay);
            }
        } else if !ctx.is_selected(unit) {
            ctx.deselect_all();
            ctx.select_item(unit)?;
        }

        let selected = ctx.selected_items();
        if let Some(session) = TransformSession::begin_items(ctx.scene(), &selected, event.point) {
            ctx.begin_transform(session)?;
            self.state = SelectState::ItemSelectedArmed;
        }
        Ok(ToolTransition::Stay)
    }

    pub fn on_key(&mut self, ctx: &mut EditorContext, command: KeyCommand) -> EditResult<ToolTransition> {
        match command {
            KeyCommand::Cancel => {
                self.reset(ctx);
                ctx.deselect_all();
            }
            KeyCommand::Delete => {
                self.reset(ctx);
                ctx.delete_selected()?;
            }
            KeyCommand::SelectAll => ctx.select_all_items()?,
            KeyCommand::Invert | KeyCommand::Undo | KeyCommand::Redo => {}
        }
        Ok(ToolTransition::Stay)
    }

    /// Abandon any gesture in progress, restoring drag origins.
    pub fn reset(&mut self, ctx: &mut EditorContext) {
        match self.state {
            SelectState::ItemSelectedArmed => ctx.cancel_transform(),
            SelectState::MarqueeActive => {
                if let Err(err) = ctx.cancel_marquee() {
                    log::warn!("Failed to cancel marquee: {err}");
                }
            }
            SelectState::Idle => {}
        }
        self.state = SelectState::Idle;
    }

    fn editable_unit_at(&self, ctx: &EditorContext, point: Point) -> EditResult<Option<ItemId>> {
        Ok(ctx
            .hit_test(point, &HitOptions::default())?
            .map(|hit| ctx.scene().selectable_unit(hit.item))
            .filter(|&unit| ctx.scene().has_path_geometry(unit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, PointerTracker};
    use crate::scene::{ItemKind, ItemStyle, PathGeometry, SerializableColor, ShapeGeometry};
    use kurbo::Rect;

    fn square(x: f64, y: f64) -> PathGeometry {
        PathGeometry::from_points(
            &[
                Point::new(x, y),
                Point::new(x + 20.0, y),
                Point::new(x + 20.0, y + 20.0),
                Point::new(x, y + 20.0),
            ],
            true,
        )
    }

    fn ready() -> (EditorContext, ItemId, ItemId) {
        let mut ctx = EditorContext::default();
        ctx.setup().unwrap();
        let a = ctx.add_path("A", square(0.0, 0.0)).unwrap();
        let b = ctx.add_path("B", square(100.0, 0.0)).unwrap();
        ctx.save_snapshot("Add shapes").unwrap();
        (ctx, a, b)
    }

    fn down(point: Point, modifiers: Modifiers, at: u64) -> PointerEvent {
        PointerEvent::new(PointerKind::Down, point)
            .with_modifiers(modifiers)
            .at(at)
    }

    fn up(point: Point) -> PointerEvent {
        PointerEvent::new(PointerKind::Up, point)
    }

    #[test]
    fn test_click_selects_and_arms() {
        let (mut ctx, a, _) = ready();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 0))
            .unwrap();
        assert_eq!(tool.state(), SelectState::ItemSelectedArmed);
        assert_eq!(ctx.selected_items(), vec![a]);

        let depth = ctx.history().len();
        tool.on_pointer(&mut ctx, &up(Point::new(0.0, 10.0))).unwrap();
        assert_eq!(tool.state(), SelectState::Idle);
        assert_eq!(ctx.history().len(), depth, "click without drag must not snapshot");
    }

    #[test]
    fn test_shift_click_toggles() {
        let (mut ctx, a, b) = ready();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 0))
            .unwrap();
        tool.on_pointer(&mut ctx, &up(Point::new(0.0, 10.0))).unwrap();
        tool.on_pointer(&mut ctx, &down(Point::new(100.0, 10.0), Modifiers::shift(), 1000))
            .unwrap();
        tool.on_pointer(&mut ctx, &up(Point::new(100.0, 10.0))).unwrap();
        assert_eq!(ctx.selected_items(), vec![a, b]);

        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::shift(), 2000))
            .unwrap();
        assert_eq!(tool.state(), SelectState::Idle);
        assert_eq!(ctx.selected_items(), vec![b]);
    }

    #[test]
    fn test_click_on_front_fill_ignores_outline_behind() {
        let mut ctx = EditorContext::default();
        ctx.setup().unwrap();
        let back = ctx.add_path("back", square(40.0, 40.0)).unwrap();
        let front = ctx
            .add_path(
                "front",
                PathGeometry::from_points(
                    &[
                        Point::new(0.0, 0.0),
                        Point::new(100.0, 0.0),
                        Point::new(100.0, 100.0),
                        Point::new(0.0, 100.0),
                    ],
                    true,
                )
                .with_style(ItemStyle::filled(SerializableColor::new(0, 128, 0, 255))),
            )
            .unwrap();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(50.0, 41.0), Modifiers::NONE, 0))
            .unwrap();
        assert_eq!(ctx.selected_items(), vec![front]);
        assert!(!ctx.is_selected(back));
    }

    #[test]
    fn test_click_resolves_to_group() {
        let (mut ctx, a, b) = ready();
        let group = ctx.scene_mut().group(&[a, b]).unwrap();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 0))
            .unwrap();
        assert_eq!(ctx.selected_items(), vec![group]);
    }

    #[test]
    fn test_empty_click_starts_marquee() {
        let (mut ctx, a, b) = ready();
        let mut tool = SelectTool::new();
        let mut pointer = PointerTracker::new();
        tool.on_pointer(&mut ctx, &pointer.press(Point::new(-10.0, -10.0), Modifiers::NONE, 0))
            .unwrap();
        assert_eq!(tool.state(), SelectState::MarqueeActive);
        tool.on_pointer(&mut ctx, &pointer.move_to(Point::new(50.0, 50.0), Modifiers::NONE, 10))
            .unwrap();
        tool.on_pointer(&mut ctx, &pointer.release(Point::new(50.0, 50.0), Modifiers::NONE, 20))
            .unwrap();
        assert_eq!(ctx.selected_items(), vec![a]);
        assert!(!ctx.is_selected(b));
    }

    #[test]
    fn test_two_quick_downs_enter_edit_mode() {
        let (mut ctx, a, _) = ready();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 1000))
            .unwrap();
        tool.on_pointer(&mut ctx, &up(Point::new(0.0, 10.0))).unwrap();
        let transition = tool
            .on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 1200))
            .unwrap();
        assert_eq!(transition, ToolTransition::EnterEditMode(a));
    }

    #[test]
    fn test_slow_downs_do_not_enter_edit_mode() {
        let (mut ctx, _, _) = ready();
        let mut tool = SelectTool::new();
        tool.on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 1000))
            .unwrap();
        tool.on_pointer(&mut ctx, &up(Point::new(0.0, 10.0))).unwrap();
        let transition = tool
            .on_pointer(&mut ctx, &down(Point::new(0.0, 10.0), Modifiers::NONE, 1400))
            .unwrap();
        assert_eq!(transition, ToolTransition::Stay);
    }

    #[test]
    fn test_double_click_on_shape_stays() {
        let (mut ctx, _, _) = ready();
        let layer = ctx.active_layer();
        ctx.scene_mut()
            .insert(
                Some(layer),
                "box",
                ItemKind::Shape(ShapeGeometry::rectangle(Rect::new(300.0, 0.0, 320.0, 20.0))),
            )
            .unwrap();
        let mut tool = SelectTool::new();
        let click = PointerEvent::new(PointerKind::DoubleClick, Point::new(300.0, 10.0));
        assert_eq!(tool.on_pointer(&mut ctx, &click).unwrap(), ToolTransition::Stay);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let (mut ctx, a, _) = ready();
        let mut tool = SelectTool::new();
        let mut pointer = PointerTracker::new();
        tool.on_pointer(&mut ctx, &pointer.press(Point::new(0.0, 10.0), Modifiers::NONE, 0))
            .unwrap();
        tool.on_pointer(&mut ctx, &pointer.move_to(Point::new(30.0, 10.0), Modifiers::NONE, 10))
            .unwrap();
        assert_eq!(ctx.scene().position(a), Some(Point::new(40.0, 10.0)));
        tool.on_key(&mut ctx, KeyCommand::Cancel).unwrap();
        assert_eq!(ctx.scene().position(a), Some(Point::new(10.0, 10.0)));
        assert!(ctx.selected_items().is_empty());
        assert!(!ctx.is_transforming());
    }

    #[test]
    fn test_delete_key() {
        let (mut ctx, a, b) = ready();
        let mut tool = SelectTool::new();
        ctx.select_item(a).unwrap();
        tool.on_key(&mut ctx, KeyCommand::Delete).unwrap();
        assert!(!ctx.scene().contains(a));
        assert!(ctx.scene().contains(b));
        assert_eq!(ctx.history().current().unwrap().label, "Delete");
    }

    #[test]
    fn test_select_all_skips_internal() {
        let (mut ctx, a, b) = ready();
        let mut tool = SelectTool::new();
        tool.on_key(&mut ctx, KeyCommand::SelectAll).unwrap();
        assert_eq!(ctx.selected_items(), vec![a, b]);
    }
}
