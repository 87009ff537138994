//! The scene graph arena and its structural operations.

use super::{CompoundGeometry, FillRule, GraphicItem, ItemId, ItemKind, PathGeometry};
use crate::config::DEFAULT_INTERNAL_PREFIX;
use crate::error::{EditError, EditResult};
use kurbo::{Affine, Point, Rect, Vec2};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Axis to mirror a set of items across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Owned hierarchy of graphic items.
///
/// Items live in an arena keyed by id. Each item is listed in exactly one
/// parent's `children` (or in `roots`, which hold layers only).
#[derive(Debug, Clone)]
pub struct SceneGraph {
    document_id: String,
    items: HashMap<ItemId, GraphicItem>,
    roots: Vec<ItemId>,
    next_id: u64,
    internal_prefix: String,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            document_id: Uuid::new_v4().to_string(),
            items: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            internal_prefix: DEFAULT_INTERNAL_PREFIX.to_string(),
        }
    }

    pub(crate) fn from_parts(document_id: String, next_id: u64) -> Self {
        Self {
            document_id,
            next_id,
            ..Self::new()
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn set_internal_prefix(&mut self, prefix: impl Into<String>) {
        self.internal_prefix = prefix.into();
    }

    pub fn internal_prefix(&self) -> &str {
        &self.internal_prefix
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&GraphicItem> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut GraphicItem> {
        self.items.get_mut(&id)
    }

    fn item(&self, id: ItemId) -> EditResult<&GraphicItem> {
        self.items.get(&id).ok_or(EditError::UnknownItem(id))
    }

    pub fn path(&self, id: ItemId) -> Option<&PathGeometry> {
        self.get(id).and_then(GraphicItem::path)
    }

    pub fn path_mut(&mut self, id: ItemId) -> Option<&mut PathGeometry> {
        self.get_mut(id).and_then(GraphicItem::path_mut)
    }

    /// Top-level items (always layers), back to front.
    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.get(id).and_then(|item| item.parent)
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.get(id).map(|item| item.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ItemId) -> Vec<ItemId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor);
        }
        result
    }

    pub fn is_ancestor(&self, ancestor: ItemId, id: ItemId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// All descendants of `id` in paint order, excluding `id` itself.
    pub fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut result = Vec::new();
        for &child in self.children(id) {
            result.push(child);
            result.extend(self.descendants(child));
        }
        result
    }

    /// The item itself if it is a layer, otherwise its nearest layer ancestor.
    pub fn nearest_layer(&self, id: ItemId) -> Option<ItemId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&candidate| self.get(candidate).is_some_and(|item| item.kind.is_layer()))
    }

    /// The top-most ancestor of `id` that sits directly below a layer.
    /// This is what object-level selection operates on.
    pub fn selectable_unit(&self, id: ItemId) -> ItemId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if self.get(parent).is_some_and(|item| item.kind.is_layer()) {
                break;
            }
            current = parent;
        }
        current
    }

    /// Whether the item or one of its ancestors carries the internal prefix.
    pub fn is_internal(&self, id: ItemId) -> bool {
        std::iter::once(id).chain(self.ancestors(id)).any(|candidate| {
            self.get(candidate)
                .is_some_and(|item| item.name.starts_with(&self.internal_prefix))
        })
    }

    /// Visible itself and through all ancestors.
    pub fn is_visible(&self, id: ItemId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .all(|candidate| self.get(candidate).is_some_and(|item| item.visible))
    }

    /// Locked itself or through an ancestor.
    pub fn is_locked(&self, id: ItemId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|candidate| self.get(candidate).is_some_and(|item| item.locked))
    }

    /// Every item, back to front (depth-first, parents before children).
    pub fn paint_order(&self) -> Vec<ItemId> {
        let mut order = Vec::with_capacity(self.items.len());
        for &root in &self.roots {
            order.push(root);
            order.extend(self.descendants(root));
        }
        order
    }

    /// All layers in paint order.
    pub fn layers(&self) -> Vec<ItemId> {
        self.paint_order()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|item| item.kind.is_layer()))
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<ItemId> {
        self.paint_order()
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|item| item.name == name))
    }

    /// Path items within the subtree rooted at `id` (including `id`).
    pub fn path_items(&self, id: ItemId) -> Vec<ItemId> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter(|&candidate| self.get(candidate).is_some_and(|item| item.kind.is_path()))
            .collect()
    }

    pub fn has_path_geometry(&self, id: ItemId) -> bool {
        !self.path_items(id).is_empty()
    }

    /// Drop duplicates and any id whose ancestor is also listed, keeping order.
    pub fn top_level_of(&self, ids: &[ItemId]) -> Vec<ItemId> {
        let set: HashSet<ItemId> = ids.iter().copied().collect();
        let mut seen = HashSet::new();
        ids.iter()
            .copied()
            .filter(|&id| self.contains(id))
            .filter(|&id| !self.ancestors(id).iter().any(|a| set.contains(a)))
            .filter(|&id| seen.insert(id))
            .collect()
    }

    // --- insertion and removal ---

    /// Add a new top-level layer.
    pub fn add_layer(&mut self, name: impl Into<String>) -> ItemId {
        let id = self.allocate_id();
        let item = GraphicItem::new(id, name.into(), ItemKind::Layer);
        self.items.insert(id, item);
        self.roots.push(id);
        id
    }

    /// Append a new item under `parent` (`None` only for layers).
    pub fn insert(
        &mut self,
        parent: Option<ItemId>,
        name: impl Into<String>,
        kind: ItemKind,
    ) -> EditResult<ItemId> {
        self.insert_at(parent, usize::MAX, name, kind)
    }

    /// Insert a new item under `parent` at `index` (clamped).
    pub fn insert_at(
        &mut self,
        parent: Option<ItemId>,
        index: usize,
        name: impl Into<String>,
        kind: ItemKind,
    ) -> EditResult<ItemId> {
        self.check_placement(parent, &kind)?;
        let id = self.allocate_id();
        self.items.insert(id, GraphicItem::new(id, name.into(), kind));
        self.attach(id, parent, index);
        Ok(id)
    }

    /// Re-insert an item with a known id. Used when rebuilding from a snapshot.
    pub(crate) fn restore(
        &mut self,
        parent: Option<ItemId>,
        mut item: GraphicItem,
    ) -> EditResult<ItemId> {
        let id = item.id;
        if self.items.contains_key(&id) {
            return Err(EditError::InvalidSnapshot(format!("duplicate item id {id}")));
        }
        self.check_placement(parent, &item.kind)?;
        item.parent = None;
        item.children.clear();
        self.items.insert(id, item);
        self.attach(id, parent, usize::MAX);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(id)
    }

    /// Remove an item and its whole subtree. Returns the removed ids.
    pub fn remove(&mut self, id: ItemId) -> EditResult<Vec<ItemId>> {
        self.item(id)?;
        self.detach(id);
        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for removed_id in &removed {
            self.items.remove(removed_id);
        }
        Ok(removed)
    }

    /// Move an existing item under a new parent at `index` (clamped).
    pub fn reparent(&mut self, id: ItemId, parent: Option<ItemId>, index: usize) -> EditResult<()> {
        let kind = self.item(id)?.kind.clone();
        if parent.is_some_and(|parent| parent == id || self.is_ancestor(id, parent)) {
            return Err(EditError::InvalidHierarchy(format!(
                "cannot move {id} inside itself"
            )));
        }
        self.check_placement(parent, &kind)?;
        self.detach(id);
        self.attach(id, parent, index);
        Ok(())
    }

    /// Index of `id` within its parent's children (or the roots).
    pub fn index_in_parent(&self, id: ItemId) -> Option<usize> {
        let siblings = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        };
        siblings.iter().position(|&sibling| sibling == id)
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_placement(&self, parent: Option<ItemId>, kind: &ItemKind) -> EditResult<()> {
        match parent {
            None if kind.is_layer() => Ok(()),
            None => Err(EditError::InvalidHierarchy(
                "only layers may be top-level".to_string(),
            )),
            Some(parent) => {
                let parent_item = self.item(parent)?;
                if parent_item.kind.accepts(kind) {
                    Ok(())
                } else {
                    Err(EditError::InvalidHierarchy(format!(
                        "{} cannot contain this item",
                        parent_item.name
                    )))
                }
            }
        }
    }

    fn attach(&mut self, id: ItemId, parent: Option<ItemId>, index: usize) {
        let siblings = match parent.and_then(|p| self.items.get_mut(&p)) {
            Some(parent_item) => &mut parent_item.children,
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = parent;
        }
    }

    fn detach(&mut self, id: ItemId) {
        match self.parent(id) {
            Some(parent) => {
                if let Some(parent_item) = self.items.get_mut(&parent) {
                    parent_item.children.retain(|&child| child != id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = None;
        }
    }

    // --- geometry ---

    /// Union of the geometry bounds in the subtree rooted at `id`.
    pub fn bounds(&self, id: ItemId) -> Option<Rect> {
        let own = self.get(id)?.kind.own_bounds();
        self.children(id)
            .iter()
            .filter_map(|&child| self.bounds(child))
            .fold(own, |acc, rect| Some(acc.map_or(rect, |acc| acc.union(rect))))
    }

    /// Combined bounds of several items.
    pub fn bounds_of(&self, ids: &[ItemId]) -> Option<Rect> {
        ids.iter()
            .filter_map(|&id| self.bounds(id))
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Centre of the item's bounds.
    pub fn position(&self, id: ItemId) -> Option<Point> {
        self.bounds(id).map(|rect| rect.center())
    }

    /// Move an item and its subtree.
    pub fn translate(&mut self, id: ItemId, offset: Vec2) -> EditResult<()> {
        self.item(id)?;
        for target in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(item) = self.items.get_mut(&target) {
                item.kind.translate(offset);
            }
        }
        Ok(())
    }

    /// Apply an affine transform to an item and its subtree.
    pub fn transform(&mut self, id: ItemId, affine: Affine) -> EditResult<()> {
        self.item(id)?;
        for target in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(item) = self.items.get_mut(&target) {
                item.kind.transform(affine);
            }
        }
        Ok(())
    }

    /// Move an item so that its bounds centre lands on `position`.
    pub fn set_position(&mut self, id: ItemId, position: Point) -> EditResult<()> {
        match self.position(id) {
            Some(current) => self.translate(id, position - current),
            None => {
                self.item(id)?;
                Ok(())
            }
        }
    }

    /// Clear the transient `selected` flag on every segment.
    pub fn clear_segment_selection(&mut self) {
        for item in self.items.values_mut() {
            if let Some(path) = item.path_mut() {
                path.set_all_selected(false);
            }
        }
    }

    // --- structural commands ---

    /// Sort ids back to front.
    pub fn sort_by_paint_order(&self, ids: &mut [ItemId]) {
        let order: HashMap<ItemId, usize> = self
            .paint_order()
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();
        ids.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }

    /// Parent and insertion index just above the front-most of `ids`.
    fn slot_above(&self, ids: &[ItemId]) -> EditResult<(ItemId, usize)> {
        let front = ids
            .last()
            .copied()
            .ok_or_else(|| EditError::InvalidHierarchy("nothing selected".to_string()))?;
        let parent = self.parent(front).ok_or_else(|| {
            EditError::InvalidHierarchy(format!("{front} has no parent container"))
        })?;
        let index = self.index_in_parent(front).unwrap_or(usize::MAX);
        Ok((parent, index.saturating_add(1)))
    }

    /// Wrap the given items in a new group placed where the front-most was.
    pub fn group(&mut self, ids: &[ItemId]) -> EditResult<ItemId> {
        let mut members: Vec<ItemId> = self
            .top_level_of(ids)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|item| !item.kind.is_layer()))
            .collect();
        self.sort_by_paint_order(&mut members);
        let (parent, index) = self.slot_above(&members)?;
        let group = self.insert_at(Some(parent), index, "Group", ItemKind::Group)?;
        for member in members {
            self.reparent(member, Some(group), usize::MAX)?;
        }
        log::debug!("Grouped items into {group}");
        Ok(group)
    }

    /// Dissolve a group, moving its children into the group's parent.
    pub fn ungroup(&mut self, id: ItemId) -> EditResult<Vec<ItemId>> {
        if !matches!(self.item(id)?.kind, ItemKind::Group) {
            return Err(EditError::InvalidHierarchy(format!("{id} is not a group")));
        }
        let parent = self.parent(id);
        let index = self.index_in_parent(id).unwrap_or(usize::MAX);
        let children = self.children(id).to_vec();
        for (offset, &child) in children.iter().enumerate() {
            self.reparent(child, parent, index.saturating_add(offset))?;
        }
        self.remove(id)?;
        Ok(children)
    }

    /// Combine paths into an even-odd compound path.
    pub fn make_compound(&mut self, ids: &[ItemId]) -> EditResult<ItemId> {
        let mut paths: Vec<ItemId> = self
            .top_level_of(ids)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|item| item.kind.is_path()))
            .collect();
        self.sort_by_paint_order(&mut paths);
        let (parent, index) = self.slot_above(&paths)?;
        let style = paths
            .first()
            .and_then(|&id| self.path(id))
            .map(|path| path.style.clone())
            .unwrap_or_default();
        let kind = ItemKind::CompoundPath(CompoundGeometry {
            fill_rule: FillRule::EvenOdd,
            style,
        });
        let compound = self.insert_at(Some(parent), index, "Compound Path", kind)?;
        for path in paths {
            self.reparent(path, Some(compound), usize::MAX)?;
        }
        log::debug!("Created compound path {compound}");
        Ok(compound)
    }

    /// Split a compound path back into standalone paths carrying its style.
    pub fn release_compound(&mut self, id: ItemId) -> EditResult<Vec<ItemId>> {
        let style = match &self.item(id)?.kind {
            ItemKind::CompoundPath(compound) => compound.style.clone(),
            _ => {
                return Err(EditError::InvalidHierarchy(format!(
                    "{id} is not a compound path"
                )));
            }
        };
        let parent = self.parent(id);
        let index = self.index_in_parent(id).unwrap_or(usize::MAX);
        let children = self.children(id).to_vec();
        for (offset, &child) in children.iter().enumerate() {
            self.reparent(child, parent, index.saturating_add(offset))?;
            if let Some(path) = self.path_mut(child) {
                path.style = style.clone();
            }
        }
        self.remove(id)?;
        Ok(children)
    }

    /// Deep-copy an item with fresh ids, placing the copy just above it.
    pub fn duplicate(&mut self, id: ItemId) -> EditResult<ItemId> {
        let parent = self.parent(id);
        let index = self.index_in_parent(id).unwrap_or(usize::MAX);
        self.copy_subtree(id, parent, index.saturating_add(1))
    }

    fn copy_subtree(
        &mut self,
        source: ItemId,
        parent: Option<ItemId>,
        index: usize,
    ) -> EditResult<ItemId> {
        let original = self.item(source)?.clone();
        let mut kind = original.kind;
        if let ItemKind::Path(path) = &mut kind {
            path.set_all_selected(false);
        }
        let copy = self.insert_at(parent, index, original.name, kind)?;
        if let Some(item) = self.items.get_mut(&copy) {
            item.visible = original.visible;
            item.locked = original.locked;
            item.guide = original.guide;
        }
        for child in original.children {
            self.copy_subtree(child, Some(copy), usize::MAX)?;
        }
        Ok(copy)
    }

    /// Mirror items about the centre of their combined bounds.
    pub fn flip(&mut self, ids: &[ItemId], axis: FlipAxis) -> EditResult<()> {
        let targets = self.top_level_of(ids);
        let Some(bounds) = self.bounds_of(&targets) else {
            return Ok(());
        };
        let center = bounds.center().to_vec2();
        let mirror = match axis {
            FlipAxis::Horizontal => Affine::scale_non_uniform(-1.0, 1.0),
            FlipAxis::Vertical => Affine::scale_non_uniform(1.0, -1.0),
        };
        let affine = Affine::translate(center) * mirror * Affine::translate(-center);
        for id in targets {
            self.transform(id, affine)?;
        }
        Ok(())
    }
}
