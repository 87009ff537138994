//! Scene graph: layers, groups, paths, compound paths and primitive shapes.

mod graph;
mod item;
mod path;
mod serialize;

pub use graph::{FlipAxis, SceneGraph};
pub use item::{
    GraphicItem, ItemId, ItemKind, ItemStyle, SerializableColor, ShapeGeometry, ShapeKind,
};
pub use path::{CompoundGeometry, FillRule, HandleSide, PathGeometry, Segment};
