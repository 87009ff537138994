//! Pointer-driven tools and the manager that switches between them.

mod edit;
mod select;

pub use edit::{EditState, EditTool};
pub use select::{SelectState, SelectTool};

use crate::context::EditorContext;
use crate::error::EditResult;
use crate::input::{KeyCommand, KeyEvent, PointerEvent};
use crate::scene::ItemId;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    /// Object-level selection and moving.
    #[default]
    Select,
    /// Geometry-level editing of one target.
    Edit,
}

/// What a tool asks the manager to do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTransition {
    Stay,
    EnterEditMode(ItemId),
    ExitEditMode,
}

/// Routes input to the current tool and performs tool switches.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    current: ToolKind,
    select: SelectTool,
    edit: EditTool,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current
    }

    pub fn select_tool(&self) -> &SelectTool {
        &self.select
    }

    pub fn edit_tool(&self) -> &EditTool {
        &self.edit
    }

    /// Dispatch a pointer event to the current tool.
    pub fn handle_pointer(&mut self, ctx: &mut EditorContext, event: &PointerEvent) -> EditResult<()> {
        if self.current == ToolKind::Edit && ctx.edit_target().is_none() {
            self.exit_edit_mode(ctx);
        }
        let transition = match self.current {
            ToolKind::Select => self.select.on_pointer(ctx, event)?,
            ToolKind::Edit => self.edit.on_pointer(ctx, event)?,
        };
        self.apply(ctx, transition)
    }

    /// Dispatch a key press. Returns whether it mapped to a command.
    pub fn handle_key(&mut self, ctx: &mut EditorContext, event: &KeyEvent) -> EditResult<bool> {
        let Some(command) = KeyCommand::from_event(event) else {
            return Ok(false);
        };
        let transition = match command {
            KeyCommand::Undo | KeyCommand::Redo => {
                self.select.reset(ctx);
                self.edit.reset(ctx);
                if command == KeyCommand::Undo {
                    ctx.undo()?;
                } else {
                    ctx.redo()?;
                }
                if self.current == ToolKind::Edit && ctx.edit_target().is_none() {
                    ToolTransition::ExitEditMode
                } else {
                    ToolTransition::Stay
                }
            }
            _ => match self.current {
                ToolKind::Select => self.select.on_key(ctx, command)?,
                ToolKind::Edit => self.edit.on_key(ctx, command)?,
            },
        };
        self.apply(ctx, transition)?;
        Ok(true)
    }

    /// Switch to the edit tool with `target` as the edit target.
    pub fn enter_edit_mode(&mut self, ctx: &mut EditorContext, target: ItemId) -> EditResult<()> {
        self.select.reset(ctx);
        ctx.set_edit_target(target)?;
        self.edit.reset(ctx);
        self.current = ToolKind::Edit;
        log::debug!("Entered edit mode on {target}");
        Ok(())
    }

    /// Return to the select tool; the former target stays selected.
    pub fn exit_edit_mode(&mut self, ctx: &mut EditorContext) {
        self.edit.reset(ctx);
        ctx.clear_edit_target();
        self.current = ToolKind::Select;
        log::debug!("Exited edit mode");
    }

    fn apply(&mut self, ctx: &mut EditorContext, transition: ToolTransition) -> EditResult<()> {
        match transition {
            ToolTransition::Stay => Ok(()),
            ToolTransition::EnterEditMode(target) => self.enter_edit_mode(ctx, target),
            ToolTransition::ExitEditMode => {
                self.exit_edit_mode(ctx);
                Ok(())
            }
        }
    }
}
