//! Graphic items and their styles.

use super::{CompoundGeometry, PathGeometry};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when flattening primitive shapes to bezier paths.
const SHAPE_PATH_TOLERANCE: f64 = 0.1;

/// Stable numeric identifier of an item within one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Paint attributes of a geometric item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    /// Fill color (None = no fill, not fill-hittable).
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    #[serde(default)]
    pub stroke: Option<SerializableColor>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

fn default_stroke_width() -> f64 {
    1.0
}

impl Default for ItemStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: Some(SerializableColor::black()),
            stroke_width: default_stroke_width(),
        }
    }
}

impl ItemStyle {
    pub fn filled(color: impl Into<SerializableColor>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Self::default()
        }
    }
}

/// Primitive shape variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

/// A primitive shape described by its frame. It has no editable segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeGeometry {
    pub shape: ShapeKind,
    pub frame: Rect,
    #[serde(default)]
    pub style: ItemStyle,
}

impl ShapeGeometry {
    pub fn rectangle(frame: Rect) -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            frame,
            style: ItemStyle::default(),
        }
    }

    pub fn ellipse(frame: Rect) -> Self {
        Self {
            shape: ShapeKind::Ellipse,
            frame,
            style: ItemStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ItemStyle) -> Self {
        self.style = style;
        self
    }

    pub fn to_bez_path(&self) -> BezPath {
        match self.shape {
            ShapeKind::Rectangle => self.frame.to_path(SHAPE_PATH_TOLERANCE),
            ShapeKind::Ellipse => Ellipse::from_rect(self.frame).to_path(SHAPE_PATH_TOLERANCE),
        }
    }

    /// Map the frame corners through `affine`; the frame stays axis-aligned.
    pub fn transform(&mut self, affine: Affine) {
        let a = affine * Point::new(self.frame.x0, self.frame.y0);
        let b = affine * Point::new(self.frame.x1, self.frame.y1);
        self.frame = Rect::from_points(a, b);
    }
}

/// The closed set of item varieties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemKind {
    Layer,
    Group,
    Path(PathGeometry),
    CompoundPath(CompoundGeometry),
    Shape(ShapeGeometry),
}

impl ItemKind {
    pub fn is_layer(&self) -> bool {
        matches!(self, ItemKind::Layer)
    }

    pub fn is_path(&self) -> bool {
        matches!(self, ItemKind::Path(_))
    }

    /// Whether items of this kind may own children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ItemKind::Layer | ItemKind::Group | ItemKind::CompoundPath(_)
        )
    }

    /// Whether `child` may be placed directly under an item of this kind.
    pub fn accepts(&self, child: &ItemKind) -> bool {
        match self {
            ItemKind::Layer => true,
            ItemKind::Group => !child.is_layer(),
            ItemKind::CompoundPath(_) => child.is_path(),
            ItemKind::Path(_) | ItemKind::Shape(_) => false,
        }
    }

    pub fn style(&self) -> Option<&ItemStyle> {
        match self {
            ItemKind::Path(path) => Some(&path.style),
            ItemKind::CompoundPath(compound) => Some(&compound.style),
            ItemKind::Shape(shape) => Some(&shape.style),
            ItemKind::Layer | ItemKind::Group => None,
        }
    }

    /// Bounds of this item's own geometry (containers have none).
    pub fn own_bounds(&self) -> Option<Rect> {
        match self {
            ItemKind::Path(path) => path.bounds(),
            ItemKind::Shape(shape) => Some(shape.frame),
            ItemKind::Layer | ItemKind::Group | ItemKind::CompoundPath(_) => None,
        }
    }

    pub(crate) fn translate(&mut self, offset: Vec2) {
        match self {
            ItemKind::Path(path) => path.translate(offset),
            ItemKind::Shape(shape) => shape.frame = shape.frame + offset,
            ItemKind::Layer | ItemKind::Group | ItemKind::CompoundPath(_) => {}
        }
    }

    pub(crate) fn transform(&mut self, affine: Affine) {
        match self {
            ItemKind::Path(path) => path.transform(affine),
            ItemKind::Shape(shape) => shape.transform(affine),
            ItemKind::Layer | ItemKind::Group | ItemKind::CompoundPath(_) => {}
        }
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicItem {
    pub id: ItemId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Guides are only hit-testable on request.
    pub guide: bool,
    pub kind: ItemKind,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
}

impl GraphicItem {
    pub(crate) fn new(id: ItemId, name: String, kind: ItemKind) -> Self {
        Self {
            id,
            name,
            visible: true,
            locked: false,
            guide: false,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn path(&self) -> Option<&PathGeometry> {
        match &self.kind {
            ItemKind::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut PathGeometry> {
        match &mut self.kind {
            ItemKind::Path(path) => Some(path),
            _ => None,
        }
    }
}
