//! JSON snapshot format of a scene graph.
//!
//! The document is a nested tree mirroring the hierarchy, so sibling order is
//! preserved by construction. Transient segment selection is not written.

use super::{GraphicItem, ItemId, ItemKind, SceneGraph};
use crate::error::{EditError, EditResult};
use serde::{Deserialize, Serialize};

fn default_visible() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneDocument {
    document: String,
    next_id: u64,
    #[serde(default)]
    layers: Vec<ItemNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemNode {
    id: ItemId,
    name: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    guide: bool,
    kind: ItemKind,
    #[serde(default)]
    children: Vec<ItemNode>,
}

impl SceneGraph {
    /// Serialize the whole graph, including ids and the id allocator.
    pub fn to_json(&self) -> EditResult<String> {
        let document = SceneDocument {
            document: self.document_id().to_string(),
            next_id: self.next_id(),
            layers: self.roots().iter().filter_map(|&id| self.node(id)).collect(),
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// Rebuild a graph from `to_json` output.
    pub fn from_json(json: &str) -> EditResult<Self> {
        let document: SceneDocument = serde_json::from_str(json)?;
        let mut scene = SceneGraph::from_parts(document.document, document.next_id);
        for layer in document.layers {
            if !layer.kind.is_layer() {
                return Err(EditError::InvalidSnapshot(format!(
                    "top-level item {} is not a layer",
                    layer.id
                )));
            }
            scene.restore_node(None, layer)?;
        }
        Ok(scene)
    }

    fn node(&self, id: ItemId) -> Option<ItemNode> {
        let item = self.get(id)?;
        Some(ItemNode {
            id,
            name: item.name.clone(),
            visible: item.visible,
            locked: item.locked,
            guide: item.guide,
            kind: item.kind.clone(),
            children: item
                .children()
                .iter()
                .filter_map(|&child| self.node(child))
                .collect(),
        })
    }

    fn restore_node(&mut self, parent: Option<ItemId>, node: ItemNode) -> EditResult<()> {
        let mut item = GraphicItem::new(node.id, node.name, node.kind);
        item.visible = node.visible;
        item.locked = node.locked;
        item.guide = node.guide;
        let id = self.restore(parent, item)?;
        for child in node.children {
            self.restore_node(Some(id), child)?;
        }
        Ok(())
    }
}
