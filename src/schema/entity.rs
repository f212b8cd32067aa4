use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::geometry::Vec3;
use super::scene::AccessError;

/// Newtype wrapper for host entity handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// What the host reports about an entity at the moment it is asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub type_tag: String,
    pub position: Vec3,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Host lookup from handle to current entity data.
///
/// `Ok(None)` means the handle is null or no longer resolves.
pub trait EntitySource {
    fn snapshot(&self, handle: EntityHandle) -> Result<Option<EntitySnapshot>, AccessError>;
}

/// Narration category of an entity. Declaration order is the priority
/// rank used to pick one representative among co-located entities:
/// lower wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EntityCategory {
    MapExit,
    SavePoint,
    Treasure,
    Npc,
    ShopNpc,
    InteractiveTrigger,
    Teleport,
    Event,
    Unclassified,
    /// Visual, collision or trigger plumbing. Never narrated.
    Scaffolding,
}

impl EntityCategory {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn is_narratable(&self) -> bool {
        !matches!(self, Self::Scaffolding)
    }

    pub fn is_npc(&self) -> bool {
        matches!(self, Self::Npc | Self::ShopNpc)
    }

    /// Message-catalog key for the spoken category name.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::MapExit => "category.map_exit",
            Self::SavePoint => "category.save_point",
            Self::Treasure => "category.treasure",
            Self::Npc => "category.npc",
            Self::ShopNpc => "category.shop_npc",
            Self::InteractiveTrigger => "category.interactive",
            Self::Teleport => "category.teleport",
            Self::Event => "category.event",
            Self::Unclassified => "category.unclassified",
            Self::Scaffolding => "category.scaffolding",
        }
    }
}

/// One narratable entity found by a scan, relative to the scan's
/// reference position. Built fresh per scan.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub handle: EntityHandle,
    pub position: Vec3,
    pub distance: f32,
    pub type_tag: String,
    pub display_name: Option<String>,
    pub category: EntityCategory,
    pub is_npc: bool,
    pub is_treasure: bool,
}

/// A fixed set of entities, keyed by handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTable {
    entries: FxHashMap<EntityHandle, EntitySnapshot>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: EntityHandle, snapshot: EntitySnapshot) {
        self.entries.insert(handle, snapshot);
    }

    pub fn remove(&mut self, handle: EntityHandle) -> Option<EntitySnapshot> {
        self.entries.remove(&handle)
    }

    pub fn move_to(&mut self, handle: EntityHandle, position: Vec3) {
        if let Some(e) = self.entries.get_mut(&handle) {
            e.position = position;
        }
    }

    /// Handles in ascending order, so scans over the table are stable.
    pub fn handles(&self) -> Vec<EntityHandle> {
        let mut handles: Vec<EntityHandle> = self.entries.keys().copied().collect();
        handles.sort_by_key(|h| h.0);
        handles
    }
}

impl EntitySource for EntityTable {
    fn snapshot(&self, handle: EntityHandle) -> Result<Option<EntitySnapshot>, AccessError> {
        Ok(self.entries.get(&handle).cloned())
    }
}
