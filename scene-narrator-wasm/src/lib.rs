//! WASM bindings for scene-narrator, powering the interactive web demo.

use std::rc::Rc;
use wasm_bindgen::prelude::*;

use scene_narrator::core::config::NarrationConfig;
use scene_narrator::core::messages::MessageCatalog;
use scene_narrator::core::navigator::NavInput;
use scene_narrator::core::pipeline::{Narrator, Transcript};
use scene_narrator::core::scanner::spoken_name;
use scene_narrator::core::screens::ItemRecord;
use scene_narrator::schema::entity::{EntityCategory, EntityHandle, EntitySnapshot, EntityTable};
use scene_narrator::schema::geometry::Vec3;

// ---------------------------------------------------------------------------
// Embedded tables, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const DEFAULT_CONFIG: &str = include_str!("../../assets/narration.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct EntityInput {
    handle: u64,
    type_tag: String,
    position: Vec3,
    display_name: Option<String>,
}

#[derive(serde::Deserialize)]
struct ScanInput {
    reference: Vec3,
    radius: f32,
    entities: Vec<EntityInput>,
}

#[derive(serde::Serialize)]
struct ScanEntry {
    handle: u64,
    label: String,
    distance: f32,
    category: EntityCategory,
}

#[derive(serde::Serialize)]
struct ScanOutput {
    report: String,
    entries: Vec<ScanEntry>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn parse_nav_input(s: &str) -> Option<NavInput> {
    match s.to_lowercase().as_str() {
        "next" | "down" => Some(NavInput::Next),
        "previous" | "up" => Some(NavInput::Previous),
        "next_group" => Some(NavInput::NextGroup),
        "previous_group" => Some(NavInput::PreviousGroup),
        "top" => Some(NavInput::Top),
        "bottom" => Some(NavInput::Bottom),
        "repeat" => Some(NavInput::Repeat),
        _ => None,
    }
}

fn js_err(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// NarratorDemo, the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct NarratorDemo {
    narrator: Narrator,
    /// Keeps the open item screen alive until `close_item`.
    item: Option<Rc<ItemRecord>>,
}

#[wasm_bindgen]
impl NarratorDemo {
    /// Create a demo from RON config and message catalog sources. Empty
    /// strings select the built-in tables.
    #[wasm_bindgen(constructor)]
    pub fn new(config_ron: &str, messages_ron: &str) -> Result<NarratorDemo, JsError> {
        let config_src = if config_ron.trim().is_empty() {
            data::DEFAULT_CONFIG
        } else {
            config_ron
        };
        let config =
            NarrationConfig::parse_ron(config_src).map_err(|e| js_err("Config parse error", e))?;

        let mut builder = Narrator::builder().with_config(config);
        if !messages_ron.trim().is_empty() {
            let messages =
                MessageCatalog::parse_ron(messages_ron).map_err(|e| js_err("Message parse error", e))?;
            builder = builder.with_messages(messages);
        }
        let narrator = builder
            .build()
            .map_err(|e| js_err("Narrator build error", e))?;

        Ok(NarratorDemo {
            narrator,
            item: None,
        })
    }

    /// Describe a waypoint list given as a JSON array of `{x, y, z}`.
    pub fn describe_path(&self, waypoints_json: &str) -> Result<String, JsError> {
        let waypoints: Vec<Vec3> = serde_json::from_str(waypoints_json)
            .map_err(|e| js_err("Invalid waypoint JSON", e))?;
        let mut sink = Transcript::new();
        Ok(self.narrator.describe_path(&waypoints, &mut sink))
    }

    /// Scan a set of entities and return the spoken report plus the kept
    /// entries.
    ///
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "reference": {"x": 0, "y": 0, "z": 0},
    ///   "radius": 20,
    ///   "entities": [
    ///     {"handle": 1, "type_tag": "NonPlayerEntity",
    ///      "position": {"x": 0, "y": 4, "z": 0}, "display_name": "Banon"}
    ///   ]
    /// }
    /// ```
    pub fn scan(&mut self, scan_json: &str) -> Result<String, JsError> {
        let input: ScanInput =
            serde_json::from_str(scan_json).map_err(|e| js_err("Invalid scan JSON", e))?;

        let mut table = EntityTable::new();
        let mut handles = Vec::with_capacity(input.entities.len());
        for e in input.entities {
            handles.push(EntityHandle(e.handle));
            table.insert(
                EntityHandle(e.handle),
                EntitySnapshot {
                    type_tag: e.type_tag,
                    position: e.position,
                    display_name: e.display_name,
                },
            );
        }

        let mut sink = Transcript::new();
        let entries = self
            .narrator
            .announce_nearby(&table, input.reference, &handles, input.radius, &mut sink);
        let output = ScanOutput {
            report: sink.last().unwrap_or_default().to_string(),
            entries: entries
                .iter()
                .map(|e| ScanEntry {
                    handle: e.handle.0,
                    label: spoken_name(self.narrator.messages(), e),
                    distance: e.distance,
                    category: e.category,
                })
                .collect(),
        };
        serde_json::to_string(&output).map_err(|e| js_err("Serialization error", e))
    }

    /// Open an item detail session from a JSON item record. Returns the
    /// first section, or an empty string when the item has nothing to say.
    pub fn open_item(&mut self, item_json: &str) -> Result<String, JsError> {
        let item: ItemRecord =
            serde_json::from_str(item_json).map_err(|e| js_err("Invalid item JSON", e))?;
        let item = Rc::new(item);
        let mut sink = Transcript::new();
        self.narrator.open_item(&item, &mut sink);
        self.item = Some(item);
        Ok(sink.last().unwrap_or_default().to_string())
    }

    /// Feed one navigation press. Returns `undefined` when the input was
    /// not consumed.
    pub fn nav(&mut self, input: &str) -> Result<Option<String>, JsError> {
        let input = parse_nav_input(input)
            .ok_or_else(|| JsError::new(&format!("Unknown navigation input: {input}")))?;
        let mut sink = Transcript::new();
        if self.narrator.handle_nav(input, &mut sink) {
            Ok(sink.last().map(str::to_string))
        } else {
            Ok(None)
        }
    }

    /// Drop the item, as the host would when its screen closes. The next
    /// navigation press finds the session dead.
    pub fn close_item(&mut self) {
        self.item = None;
    }

    pub fn is_screen_open(&self) -> bool {
        self.narrator.navigator().is_open()
    }

    /// Return JSON array of navigation input names.
    pub fn nav_inputs() -> String {
        serde_json::to_string(&[
            "next",
            "previous",
            "next_group",
            "previous_group",
            "top",
            "bottom",
            "repeat",
        ])
        .unwrap_or_else(|_| "[]".to_string())
    }
}
