//! The editing context: one explicit owner for everything tools mutate.

use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::events::{EditorEvent, EventBus};
use crate::hit_test::{self, Hit, HitOptions};
use crate::history::{HistoryManager, HistoryState};
use crate::input::PointerEvent;
use crate::marquee::MarqueeState;
use crate::scene::{ItemId, ItemKind, ItemStyle, PathGeometry, SceneGraph, ShapeGeometry};
use crate::selection::Selection;
use crate::transform::TransformSession;
use kurbo::{Point, Rect};
use std::sync::mpsc::Receiver;

/// Name of the layer created for a fresh document.
const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// Owns the scene, selection, active layer, drag session, history and
/// event bus. Tools receive it by `&mut`.
#[derive(Debug)]
pub struct EditorContext {
    pub(crate) config: EditorConfig,
    pub(crate) scene: SceneGraph,
    pub(crate) selection: Selection,
    pub(crate) active_layer: ItemId,
    pub(crate) marquee: Option<MarqueeState>,
    pub(crate) transform: Option<TransformSession>,
    pub(crate) history: HistoryManager,
    pub(crate) events: EventBus,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorContext {
    /// Create a context holding an empty document with one layer.
    ///
    /// Hit-testing, marquee and history are unavailable until `setup` runs.
    pub fn new(config: EditorConfig) -> Self {
        let mut scene = SceneGraph::new();
        scene.set_internal_prefix(config.internal_prefix.clone());
        let active_layer = scene.add_layer(DEFAULT_LAYER_NAME);
        let history = HistoryManager::new(config.history_depth);
        Self {
            config,
            scene,
            selection: Selection::default(),
            active_layer,
            marquee: None,
            transform: None,
            history,
            events: EventBus::new(),
        }
    }

    /// Create the internal helper layer and record the initial snapshot.
    /// Calling it again is a no-op.
    pub fn setup(&mut self) -> EditResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.ensure_helpers()?;
        self.save_snapshot("Initial state")?;
        log::debug!("Editor context ready, document {}", self.scene.document_id());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.marquee.is_some()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Direct scene access for creation tools. Call `save_snapshot` after a
    /// discrete change.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&mut self, event: EditorEvent) {
        self.events.publish(event);
    }

    // --- active layer ---

    pub fn active_layer(&self) -> ItemId {
        self.active_layer
    }

    /// Make `id` the container for new geometry.
    pub fn activate_layer(&mut self, id: ItemId) -> EditResult<()> {
        let item = self.scene.get(id).ok_or(EditError::UnknownItem(id))?;
        if !item.kind.is_layer() || self.scene.is_internal(id) {
            return Err(EditError::InvalidHierarchy(format!(
                "{id} cannot be the active layer"
            )));
        }
        if self.active_layer != id {
            self.active_layer = id;
            self.notify(EditorEvent::ActiveLayerChanged(id));
        }
        Ok(())
    }

    /// Keep the active layer valid: fall back to the first user layer, or
    /// create one when none exists.
    pub(crate) fn ensure_active_layer(&mut self) {
        let valid = self.scene.get(self.active_layer).is_some_and(|item| item.kind.is_layer())
            && !self.scene.is_internal(self.active_layer);
        if valid {
            return;
        }
        let fallback = self
            .scene
            .layers()
            .into_iter()
            .find(|&layer| !self.scene.is_internal(layer));
        let layer = match fallback {
            Some(layer) => layer,
            None => {
                log::debug!("No user layer left, creating one");
                let layer = self.scene.add_layer(DEFAULT_LAYER_NAME);
                self.notify(EditorEvent::StructureChanged);
                layer
            }
        };
        self.active_layer = layer;
        self.notify(EditorEvent::ActiveLayerChanged(layer));
    }

    /// Add a path to the active layer. Used by creation tools.
    pub fn add_path(&mut self, name: impl Into<String>, path: PathGeometry) -> EditResult<ItemId> {
        self.ensure_active_layer();
        let id = self
            .scene
            .insert(Some(self.active_layer), name, ItemKind::Path(path))?;
        self.notify(EditorEvent::StructureChanged);
        Ok(id)
    }

    // --- internal helpers ---

    fn helper_layer_name(&self) -> String {
        format!("{}helpers", self.config.internal_prefix)
    }

    fn overlay_name(&self) -> String {
        format!("{}marquee", self.config.internal_prefix)
    }

    /// Find or create the helper layer and its marquee overlay, then bind
    /// the marquee state to them.
    fn ensure_helpers(&mut self) -> EditResult<()> {
        let layer_name = self.helper_layer_name();
        let layer = match self.scene.find_by_name(&layer_name) {
            Some(layer) => layer,
            None => self.scene.add_layer(layer_name),
        };
        let overlay_name = self.overlay_name();
        let existing = self
            .scene
            .children(layer)
            .iter()
            .copied()
            .find(|&child| self.scene.get(child).is_some_and(|item| item.name == overlay_name));
        let overlay = match existing {
            Some(overlay) => overlay,
            None => {
                let style = ItemStyle {
                    fill: None,
                    ..ItemStyle::default()
                };
                let shape = ShapeGeometry::rectangle(Rect::ZERO).with_style(style);
                self.scene
                    .insert(Some(layer), overlay_name, ItemKind::Shape(shape))?
            }
        };
        if let Some(item) = self.scene.get_mut(overlay) {
            item.visible = false;
        }
        self.marquee = Some(MarqueeState::new(overlay));
        Ok(())
    }

    // --- hit testing ---

    /// Hit-test the document with the configured tolerance.
    pub fn hit_test(&self, point: Point, options: &HitOptions) -> EditResult<Option<Hit>> {
        if !self.is_initialized() {
            return Err(EditError::NotInitialized("hit test"));
        }
        Ok(hit_test::hit_test(
            &self.scene,
            point,
            self.config.hit_tolerance,
            options,
        ))
    }

    /// Hit-test within one item's subtree.
    pub fn hit_test_in(
        &self,
        root: ItemId,
        point: Point,
        options: &HitOptions,
    ) -> EditResult<Option<Hit>> {
        if !self.is_initialized() {
            return Err(EditError::NotInitialized("hit test"));
        }
        Ok(hit_test::hit_test_item(
            &self.scene,
            root,
            point,
            self.config.hit_tolerance,
            options,
        ))
    }

    // --- drag sessions ---

    /// Install a drag session. Only one may be open at a time.
    pub fn begin_transform(&mut self, session: TransformSession) -> EditResult<()> {
        if self.transform.is_some() {
            return Err(EditError::TransformInProgress);
        }
        self.transform = Some(session);
        Ok(())
    }

    pub fn is_transforming(&self) -> bool {
        self.transform.is_some()
    }

    /// Feed a drag event to the open session. Returns whether geometry moved.
    pub fn apply_transform(&mut self, event: &PointerEvent) -> bool {
        let Some(session) = self.transform.as_mut() else {
            return false;
        };
        let changed = session.apply(&mut self.scene, event, &self.config);
        if changed {
            self.notify(EditorEvent::GeometryChanged);
        }
        changed
    }

    /// Close the open session. Returns whether it moved anything.
    pub fn end_transform(&mut self) -> bool {
        self.transform.take().is_some_and(TransformSession::end)
    }

    /// Abort the open session, restoring drag origins.
    pub fn cancel_transform(&mut self) {
        if let Some(session) = self.transform.take() {
            session.cancel(&mut self.scene);
            self.notify(EditorEvent::GeometryChanged);
        }
    }

    // --- history ---

    /// Record the current document as a new history state.
    pub fn save_snapshot(&mut self, label: impl Into<String>) -> EditResult<()> {
        if !self.is_initialized() {
            return Err(EditError::NotInitialized("history"));
        }
        let state = HistoryState {
            serialized_document: self.scene.to_json()?,
            active_container_id: self.active_layer.to_string(),
            label: label.into(),
        };
        self.history.save(state);
        self.notify_history();
        Ok(())
    }

    /// Restore the previous state. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> EditResult<bool> {
        self.drop_stale_transform();
        match self.history.undo().cloned() {
            Some(state) => {
                self.restore(&state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-apply the next state. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> EditResult<bool> {
        self.drop_stale_transform();
        match self.history.redo().cloned() {
            Some(state) => {
                self.restore(&state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn drop_stale_transform(&mut self) {
        if self.transform.take().is_some() {
            log::warn!("Dropping open drag session before history restore");
        }
    }

    fn notify_history(&mut self) {
        let event = EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        self.notify(event);
    }

    /// Swap in a fully rebuilt scene from a snapshot.
    fn restore(&mut self, state: &HistoryState) -> EditResult<()> {
        let mut scene = SceneGraph::from_json(&state.serialized_document)?;
        scene.set_internal_prefix(self.config.internal_prefix.clone());
        self.scene = scene;
        self.ensure_helpers()?;

        let active = state
            .active_container_id
            .parse::<u64>()
            .map(ItemId)
            .map_err(|err| EditError::InvalidSnapshot(format!("active container: {err}")))?;
        self.active_layer = active;
        self.ensure_active_layer();

        self.selection.retain_existing(&self.scene);
        log::debug!("Restored snapshot: {}", state.label);
        self.notify(EditorEvent::StructureChanged);
        self.notify(EditorEvent::SelectionChanged);
        self.notify(EditorEvent::ActiveLayerChanged(self.active_layer));
        self.notify_history();
        Ok(())
    }
}
