//! GlyphCraft Core Library
//!
//! Editing engine for vector documents: a scene graph of layers, groups and
//! bezier paths, hit-testing, selection, marquee, drag transforms, the select
//! and edit tools, and snapshot-based undo history.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hit_test;
pub mod history;
pub mod input;
pub mod marquee;
pub mod scene;
pub mod selection;
pub mod tools;
pub mod transform;

pub use config::EditorConfig;
pub use context::EditorContext;
pub use error::{EditError, EditResult};
pub use events::{EditorEvent, EventBus};
pub use hit_test::{Hit, HitKind, HitOptions, hit_test, hit_test_item};
pub use history::{HistoryManager, HistoryState};
pub use input::{Key, KeyCommand, KeyEvent, Modifiers, PointerEvent, PointerKind, PointerTracker};
pub use marquee::{MarqueeOutcome, MarqueeState};
pub use scene::{FlipAxis, GraphicItem, ItemId, ItemKind, PathGeometry, SceneGraph, Segment};
pub use selection::{HandleRef, SegmentRef, Selection};
pub use tools::{EditState, EditTool, SelectState, SelectTool, ToolKind, ToolManager, ToolTransition};
pub use transform::TransformSession;
