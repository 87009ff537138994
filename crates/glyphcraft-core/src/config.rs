//! Tunable editor settings.

use serde::{Deserialize, Serialize};

/// Hit tolerance in world units.
pub const DEFAULT_HIT_TOLERANCE: f64 = 4.0;
/// Two downs on the same target within this window form a double-click.
pub const DEFAULT_DOUBLE_CLICK_MS: u64 = 250;
/// Maximum number of undo states to keep.
pub const DEFAULT_HISTORY_DEPTH: usize = 80;
/// Angle increment used when the snap modifier is held (45°).
pub const DEFAULT_SNAP_ANGLE: f64 = std::f64::consts::FRAC_PI_4;
/// Angular slack when deciding whether two handles are colinear.
pub const DEFAULT_COLINEAR_TOLERANCE: f64 = 0.01;
/// Name prefix reserved for system items.
pub const DEFAULT_INTERNAL_PREFIX: &str = "__";

/// Editor configuration.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pointer tolerance for anchors, handles and curves.
    pub hit_tolerance: f64,
    /// Double-click window in milliseconds.
    pub double_click_ms: u64,
    /// Undo stack depth; the oldest entry is evicted past this.
    pub history_depth: usize,
    /// Snap increment in radians.
    pub snap_angle: f64,
    /// Colinearity tolerance in radians.
    pub colinear_tolerance: f64,
    /// Items whose name starts with this are system items.
    pub internal_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            double_click_ms: DEFAULT_DOUBLE_CLICK_MS,
            history_depth: DEFAULT_HISTORY_DEPTH,
            snap_angle: DEFAULT_SNAP_ANGLE,
            colinear_tolerance: DEFAULT_COLINEAR_TOLERANCE,
            internal_prefix: DEFAULT_INTERNAL_PREFIX.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
