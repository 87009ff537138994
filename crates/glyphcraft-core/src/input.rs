//! Pointer and keyboard events consumed by the editing tools.

use crate::scene::ItemId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Modifier keys state.
///
/// `shift` doubles as multi-select and angle snap; `alt` splits symmetric
/// handles during a handle drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Drag,
    Up,
    DoubleClick,
}

/// A pointer event in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub point: Point,
    /// Movement since the previous event of this gesture.
    pub delta: Vec2,
    /// Where the current press started.
    pub down_point: Point,
    pub modifiers: Modifiers,
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, point: Point) -> Self {
        Self {
            kind,
            point,
            delta: Vec2::ZERO,
            down_point: point,
            modifiers: Modifiers::NONE,
            timestamp_ms: 0,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Builds pointer events for one gesture, tracking the press point and the
/// previous position so `delta` is always incremental.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    down_point: Point,
    last_point: Point,
    pressed: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn press(&mut self, point: Point, modifiers: Modifiers, timestamp_ms: u64) -> PointerEvent {
        self.down_point = point;
        self.last_point = point;
        self.pressed = true;
        self.event(PointerKind::Down, point, modifiers, timestamp_ms)
    }

    /// A `Drag` while pressed, a `Move` otherwise.
    pub fn move_to(&mut self, point: Point, modifiers: Modifiers, timestamp_ms: u64) -> PointerEvent {
        let kind = if self.pressed {
            PointerKind::Drag
        } else {
            PointerKind::Move
        };
        self.event(kind, point, modifiers, timestamp_ms)
    }

    pub fn release(&mut self, point: Point, modifiers: Modifiers, timestamp_ms: u64) -> PointerEvent {
        let event = self.event(PointerKind::Up, point, modifiers, timestamp_ms);
        self.pressed = false;
        event
    }

    fn event(
        &mut self,
        kind: PointerKind,
        point: Point,
        modifiers: Modifiers,
        timestamp_ms: u64,
    ) -> PointerEvent {
        let delta = point - self.last_point;
        self.last_point = point;
        PointerEvent {
            kind,
            point,
            delta,
            down_point: self.down_point,
            modifiers,
            timestamp_ms,
        }
    }
}

/// Detects two presses on the same target within a time window.
#[derive(Debug, Clone, Default)]
pub struct DoubleClickDetector {
    last: Option<(ItemId, u64)>,
}

impl DoubleClickDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press on `target`. Returns true when it completes a
    /// double-click; the detector then resets so a third press starts over.
    pub fn register(&mut self, target: ItemId, timestamp_ms: u64, window_ms: u64) -> bool {
        let is_double = matches!(
            self.last,
            Some((previous, at)) if previous == target
                && timestamp_ms >= at
                && timestamp_ms - at <= window_ms
        );
        self.last = if is_double {
            None
        } else {
            Some((target, timestamp_ms))
        };
        is_double
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Keys the tools react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Character(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Editing commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Cancel,
    Delete,
    SelectAll,
    Invert,
    Undo,
    Redo,
}

impl KeyCommand {
    /// Map a key press to a command.
    ///
    /// Escape cancels; Delete/Backspace delete; Ctrl/Cmd with A, I, Z,
    /// Shift+Z or Y select all, invert, undo and redo.
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let command = event.modifiers.is_command();
        match &event.key {
            Key::Escape => Some(KeyCommand::Cancel),
            Key::Delete | Key::Backspace => Some(KeyCommand::Delete),
            Key::Character(c) if command => match c.to_ascii_lowercase() {
                'a' => Some(KeyCommand::SelectAll),
                'i' => Some(KeyCommand::Invert),
                'z' if event.modifiers.shift => Some(KeyCommand::Redo),
                'z' => Some(KeyCommand::Undo),
                'y' => Some(KeyCommand::Redo),
                _ => None,
            },
            Key::Character(_) => None,
        }
    }
}
