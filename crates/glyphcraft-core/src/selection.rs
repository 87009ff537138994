//! Selection state and the commands that act on it.
//!
//! Object-level selection is a set of item ids. In edit mode a single edit
//! target additionally carries a sub-selection: anchor flags on its segments
//! plus explicitly selected handles.

use crate::context::EditorContext;
use crate::error::{EditError, EditResult};
use crate::events::EditorEvent;
use crate::scene::{FlipAxis, HandleSide, ItemId, ItemKind, SceneGraph};
use std::collections::BTreeSet;

/// A selected handle of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleRef {
    pub item: ItemId,
    pub index: usize,
    pub side: HandleSide,
}

/// A selected part of the edit target: an anchor when `side` is `None`,
/// otherwise one of its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentRef {
    pub item: ItemId,
    pub index: usize,
    pub side: Option<HandleSide>,
}

/// Selected items and the edit-mode sub-selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    items: BTreeSet<ItemId>,
    edit_target: Option<ItemId>,
    fully_selected: bool,
    handles: BTreeSet<HandleRef>,
}

impl Selection {
    /// Selected item ids in ascending id order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn edit_target(&self) -> Option<ItemId> {
        self.edit_target
    }

    pub fn is_fully_selected(&self) -> bool {
        self.fully_selected
    }

    pub fn handles(&self) -> impl Iterator<Item = HandleRef> + '_ {
        self.handles.iter().copied()
    }

    /// Forget ids that no longer exist, e.g. after a history restore.
    /// Snapshots carry no anchor flags, so the sub-selection starts empty.
    pub(crate) fn retain_existing(&mut self, scene: &SceneGraph) {
        self.items.retain(|&id| scene.contains(id));
        if self.edit_target.is_some_and(|target| !scene.contains(target)) {
            self.edit_target = None;
        }
        self.fully_selected = false;
        self.handles.clear();
    }
}

impl EditorContext {
    // --- object selection ---

    /// Select an item. Selecting a layer activates it (or its first child
    /// layer) instead of adding it to the set.
    pub fn select_item(&mut self, id: ItemId) -> EditResult<()> {
        self.add_to_selection(id)?;
        self.notify(EditorEvent::SelectionChanged);
        Ok(())
    }

    /// Selection without notification, shared with the marquee.
    pub(crate) fn add_to_selection(&mut self, id: ItemId) -> EditResult<()> {
        let item = self.scene.get(id).ok_or(EditError::UnknownItem(id))?;
        if self.scene.is_internal(id) {
            return Err(EditError::InvalidHierarchy(format!(
                "{id} is a system item"
            )));
        }
        if item.kind.is_layer() {
            let target = item
                .children()
                .iter()
                .copied()
                .find(|&child| self.scene.get(child).is_some_and(|c| c.kind.is_layer()))
                .unwrap_or(id);
            return self.activate_layer(target);
        }
        self.selection.items.insert(id);
        if let Some(layer) = self.scene.nearest_layer(id) {
            self.activate_layer(layer)?;
        }
        Ok(())
    }

    pub fn deselect_item(&mut self, id: ItemId) {
        if self.selection.items.remove(&id) {
            self.notify(EditorEvent::SelectionChanged);
        }
    }

    /// Flip an item's membership. Returns whether it is now selected.
    pub fn toggle_item(&mut self, id: ItemId) -> EditResult<bool> {
        if self.selection.contains(id) {
            self.deselect_item(id);
            Ok(false)
        } else {
            self.select_item(id)?;
            Ok(self.selection.contains(id))
        }
    }

    /// Select every visible, unlocked item directly inside a user layer.
    pub fn select_all_items(&mut self) -> EditResult<()> {
        let units: Vec<ItemId> = self
            .scene
            .layers()
            .into_iter()
            .filter(|&layer| !self.scene.is_internal(layer))
            .flat_map(|layer| self.scene.children(layer).to_vec())
            .filter(|&id| {
                self.scene.get(id).is_some_and(|item| !item.kind.is_layer())
                    && self.scene.is_visible(id)
                    && !self.scene.is_locked(id)
            })
            .collect();
        for id in units {
            self.add_to_selection(id)?;
        }
        self.notify(EditorEvent::SelectionChanged);
        Ok(())
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection.contains(id)
    }

    pub fn selected_items(&self) -> Vec<ItemId> {
        self.selection.items().collect()
    }

    /// Clear items, the edit target and every sub-selection, then make sure a
    /// user layer is active.
    pub fn deselect_all(&mut self) {
        self.selection.items.clear();
        self.selection.edit_target = None;
        self.reset_sub_selection();
        self.ensure_active_layer();
        self.notify(EditorEvent::SelectionChanged);
    }

    // --- edit target ---

    /// Enter edit mode on `id`: it becomes the only selected item and its
    /// sub-selection starts empty.
    pub fn set_edit_target(&mut self, id: ItemId) -> EditResult<()> {
        if !self.scene.contains(id) {
            return Err(EditError::UnknownItem(id));
        }
        if !self.scene.has_path_geometry(id) || self.scene.is_internal(id) {
            return Err(EditError::InvalidHierarchy(format!(
                "{id} has no editable geometry"
            )));
        }
        self.selection.items.clear();
        self.reset_sub_selection();
        self.add_to_selection(id)?;
        self.selection.edit_target = Some(id);
        log::debug!("Edit target set to {id}");
        self.notify(EditorEvent::SelectionChanged);
        Ok(())
    }

    /// Leave edit mode. The former target stays selected.
    pub fn clear_edit_target(&mut self) {
        if self.selection.edit_target.take().is_some() {
            self.reset_sub_selection();
            self.notify(EditorEvent::SelectionChanged);
        }
    }

    pub fn edit_target(&self) -> Option<ItemId> {
        self.selection.edit_target
    }

    /// Paths that make up the edit target (itself, or its sub-paths).
    pub fn edit_paths(&self) -> Vec<ItemId> {
        self.selection
            .edit_target
            .map(|target| self.scene.path_items(target))
            .unwrap_or_default()
    }

    fn check_edit_segment(&self, item: ItemId, index: usize) -> EditResult<()> {
        if !self.edit_paths().contains(&item) {
            return Err(EditError::InvalidHierarchy(format!(
                "{item} is not part of the edit target"
            )));
        }
        let len = self.scene.path(item).map_or(0, |path| path.len());
        if index >= len {
            return Err(EditError::InvalidHierarchy(format!(
                "segment {index} out of range for {item}"
            )));
        }
        Ok(())
    }

    fn set_segment_flag(&mut self, item: ItemId, index: usize, selected: bool) -> EditResult<()> {
        self.check_edit_segment(item, index)?;
        if let Some(segment) = self
            .scene
            .path_mut(item)
            .and_then(|path| path.segments.get_mut(index))
        {
            segment.selected = selected;
        }
        if !selected {
            self.selection
                .handles
                .retain(|handle| !(handle.item == item && handle.index == index));
        }
        self.sync_fully_selected();
        self.notify(EditorEvent::SelectionChanged);
        Ok(())
    }

    pub fn select_segment(&mut self, item: ItemId, index: usize) -> EditResult<()> {
        self.set_segment_flag(item, index, true)
    }

    pub fn deselect_segment(&mut self, item: ItemId, index: usize) -> EditResult<()> {
        self.set_segment_flag(item, index, false)
    }

    /// Returns whether the anchor is now selected.
    pub fn toggle_segment(&mut self, item: ItemId, index: usize) -> EditResult<bool> {
        let selected = self.is_segment_selected(item, index);
        self.set_segment_flag(item, index, !selected)?;
        Ok(!selected)
    }

    pub fn is_segment_selected(&self, item: ItemId, index: usize) -> bool {
        self.scene
            .path(item)
            .and_then(|path| path.segments.get(index))
            .is_some_and(|segment| segment.selected)
    }

    /// Select both anchors bounding curve `index`.
    pub fn select_curve(&mut self, item: ItemId, index: usize) -> EditResult<()> {
        let (from, to) = self
            .scene
            .path(item)
            .and_then(|path| path.curve_endpoints(index))
            .ok_or_else(|| EditError::InvalidHierarchy(format!("no curve {index} on {item}")))?;
        self.select_segment(item, from)?;
        self.select_segment(item, to)
    }

    /// Whether both anchors of curve `index` are selected.
    pub fn is_curve_selected(&self, item: ItemId, index: usize) -> bool {
        self.scene
            .path(item)
            .and_then(|path| path.curve_endpoints(index))
            .is_some_and(|(from, to)| {
                self.is_segment_selected(item, from) && self.is_segment_selected(item, to)
            })
    }

    pub fn select_handle(&mut self, item: ItemId, index: usize, side: HandleSide) -> EditResult<()> {
        self.check_edit_segment(item, index)?;
        self.selection.handles.insert(HandleRef { item, index, side });
        if let Some(segment) = self
            .scene
            .path_mut(item)
            .and_then(|path| path.segments.get_mut(index))
        {
            segment.selected = true;
        }
        self.sync_fully_selected();
        self.notify(EditorEvent::SelectionChanged);
        Ok(())
    }

    /// Select every anchor of the edit target.
    pub fn select_all_segments(&mut self) {
        for path in self.edit_paths() {
            if let Some(geometry) = self.scene.path_mut(path) {
                geometry.set_all_selected(true);
            }
        }
        self.sync_fully_selected();
        self.notify(EditorEvent::SelectionChanged);
    }

    /// Flip every anchor flag across all editable paths of the document.
    pub fn invert_segment_selection(&mut self) {
        let eligible: Vec<ItemId> = self
            .scene
            .paint_order()
            .into_iter()
            .filter(|&id| {
                self.scene.get(id).is_some_and(|item| item.kind.is_path())
                    && self.scene.is_visible(id)
                    && !self.scene.is_locked(id)
                    && !self.scene.is_internal(id)
            })
            .collect();
        for id in eligible {
            if let Some(path) = self.scene.path_mut(id) {
                for segment in &mut path.segments {
                    segment.selected = !segment.selected;
                }
            }
        }
        self.selection.handles.clear();
        self.sync_fully_selected();
        self.notify(EditorEvent::SelectionChanged);
    }

    /// Clear anchors, handles and the fully-selected flag.
    pub fn clear_sub_selection(&mut self) {
        self.reset_sub_selection();
        self.notify(EditorEvent::SelectionChanged);
    }

    fn reset_sub_selection(&mut self) {
        self.scene.clear_segment_selection();
        self.selection.handles.clear();
        self.selection.fully_selected = false;
    }

    /// Mark the whole edit target selected (every anchor) or clear it.
    pub fn set_fully_selected(&mut self, fully: bool) {
        for path in self.edit_paths() {
            if let Some(geometry) = self.scene.path_mut(path) {
                geometry.set_all_selected(fully);
            }
        }
        if !fully {
            self.selection.handles.clear();
        }
        self.selection.fully_selected = fully && self.selection.edit_target.is_some();
        self.notify(EditorEvent::SelectionChanged);
    }

    fn sync_fully_selected(&mut self) {
        let paths = self.edit_paths();
        self.selection.fully_selected = !paths.is_empty()
            && paths
                .iter()
                .all(|&id| self.scene.path(id).is_some_and(|path| path.all_selected()));
    }

    /// Selected anchors and handles of the edit target.
    pub fn selected_segment_refs(&self) -> Vec<SegmentRef> {
        let paths = self.edit_paths();
        let anchors = paths.iter().flat_map(|&item| {
            self.scene
                .path(item)
                .map(|path| path.selected_indices())
                .unwrap_or_default()
                .into_iter()
                .map(move |index| SegmentRef {
                    item,
                    index,
                    side: None,
                })
        });
        let handles = self
            .selection
            .handles()
            .filter(|handle| paths.contains(&handle.item))
            .map(|handle| SegmentRef {
                item: handle.item,
                index: handle.index,
                side: Some(handle.side),
            });
        anchors.chain(handles).collect()
    }

    /// Selected anchors of the edit target as `(path, index)` pairs.
    pub fn selected_anchors(&self) -> Vec<(ItemId, usize)> {
        self.selected_segment_refs()
            .into_iter()
            .filter(|r| r.side.is_none())
            .map(|r| (r.item, r.index))
            .collect()
    }

    // --- structural commands ---

    fn selected_units(&self) -> Vec<ItemId> {
        let ids: Vec<ItemId> = self
            .selection
            .items()
            .filter(|&id| !self.scene.is_internal(id))
            .collect();
        self.scene.top_level_of(&ids)
    }

    fn finish_structural(&mut self, label: &str) -> EditResult<()> {
        self.ensure_active_layer();
        self.notify(EditorEvent::StructureChanged);
        self.notify(EditorEvent::SelectionChanged);
        self.save_snapshot(label)
    }

    /// Delete the selected items. Returns whether anything was removed.
    pub fn delete_selected(&mut self) -> EditResult<bool> {
        let targets = self.selected_units();
        if targets.is_empty() {
            return Ok(false);
        }
        for id in &targets {
            self.scene.remove(*id)?;
        }
        self.selection.retain_existing(&self.scene);
        self.selection.items.clear();
        log::debug!("Deleted {} item(s)", targets.len());
        self.finish_structural("Delete")?;
        Ok(true)
    }

    pub fn group_selected(&mut self) -> EditResult<Option<ItemId>> {
        let targets = self.selected_units();
        if targets.is_empty() {
            return Ok(None);
        }
        let group = self.scene.group(&targets)?;
        self.selection.items.clear();
        self.add_to_selection(group)?;
        self.finish_structural("Group")?;
        Ok(Some(group))
    }

    pub fn ungroup_selected(&mut self) -> EditResult<Vec<ItemId>> {
        let groups: Vec<ItemId> = self
            .selected_units()
            .into_iter()
            .filter(|&id| matches!(self.scene.get(id).map(|item| &item.kind), Some(ItemKind::Group)))
            .collect();
        let mut released = Vec::new();
        for group in groups {
            self.selection.items.remove(&group);
            released.extend(self.scene.ungroup(group)?);
        }
        if released.is_empty() {
            return Ok(released);
        }
        for &id in &released {
            self.add_to_selection(id)?;
        }
        self.finish_structural("Ungroup")?;
        Ok(released)
    }

    /// Combine the selected paths into one compound path. Needs at least two.
    pub fn compound_selected(&mut self) -> EditResult<Option<ItemId>> {
        let paths: Vec<ItemId> = self
            .selected_units()
            .into_iter()
            .filter(|&id| self.scene.get(id).is_some_and(|item| item.kind.is_path()))
            .collect();
        if paths.len() < 2 {
            return Ok(None);
        }
        let compound = self.scene.make_compound(&paths)?;
        self.selection.items.clear();
        self.add_to_selection(compound)?;
        self.finish_structural("Make compound path")?;
        Ok(Some(compound))
    }

    pub fn release_selected(&mut self) -> EditResult<Vec<ItemId>> {
        let compounds: Vec<ItemId> = self
            .selected_units()
            .into_iter()
            .filter(|&id| {
                matches!(
                    self.scene.get(id).map(|item| &item.kind),
                    Some(ItemKind::CompoundPath(_))
                )
            })
            .collect();
        let mut released = Vec::new();
        for compound in compounds {
            self.selection.items.remove(&compound);
            released.extend(self.scene.release_compound(compound)?);
        }
        if released.is_empty() {
            return Ok(released);
        }
        for &id in &released {
            self.add_to_selection(id)?;
        }
        self.finish_structural("Release compound path")?;
        Ok(released)
    }

    /// Duplicate the selection; the copies become the new selection.
    pub fn duplicate_selected(&mut self) -> EditResult<Vec<ItemId>> {
        let targets = self.selected_units();
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let mut copies = Vec::with_capacity(targets.len());
        for id in targets {
            copies.push(self.scene.duplicate(id)?);
        }
        self.selection.items.clear();
        for &copy in &copies {
            self.add_to_selection(copy)?;
        }
        self.finish_structural("Duplicate")?;
        Ok(copies)
    }

    pub fn flip_selected(&mut self, axis: FlipAxis) -> EditResult<bool> {
        let targets = self.selected_units();
        if targets.is_empty() {
            return Ok(false);
        }
        self.scene.flip(&targets, axis)?;
        self.notify(EditorEvent::GeometryChanged);
        self.save_snapshot(match axis {
            FlipAxis::Horizontal => "Flip horizontal",
            FlipAxis::Vertical => "Flip vertical",
        })?;
        Ok(true)
    }

    /// Delete the selected anchors of the edit target. Paths left without
    /// segments are removed; a compound left without sub-paths goes too.
    /// Returns whether anything changed.
    pub fn delete_selected_segments(&mut self) -> EditResult<bool> {
        let Some(target) = self.selection.edit_target else {
            return Ok(false);
        };
        let mut removed_any = false;
        for path_id in self.edit_paths() {
            let Some(path) = self.scene.path_mut(path_id) else {
                continue;
            };
            removed_any |= path.remove_selected() > 0;
            if path.is_empty() {
                let parent = self.scene.parent(path_id);
                self.scene.remove(path_id)?;
                let emptied_compound = parent.is_some_and(|parent| {
                    matches!(
                        self.scene.get(parent).map(|item| &item.kind),
                        Some(ItemKind::CompoundPath(_))
                    ) && self.scene.children(parent).is_empty()
                });
                if let (true, Some(parent)) = (emptied_compound, parent) {
                    self.scene.remove(parent)?;
                }
            }
        }
        if !removed_any {
            return Ok(false);
        }
        self.selection.handles.clear();
        if !self.scene.contains(target) {
            self.selection.edit_target = None;
            self.selection.fully_selected = false;
        }
        self.selection.retain_existing(&self.scene);
        self.sync_fully_selected();
        self.notify(EditorEvent::GeometryChanged);
        self.finish_structural("Delete points")?;
        Ok(true)
    }
}
