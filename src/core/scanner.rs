/// Spatial entity scan: filter, classify, deduplicate and sort the
/// host's entity list relative to a reference position.
use rustc_hash::FxHashMap;

use super::config::ScannerConfig;
use super::messages::{keys, Translator};
use crate::schema::entity::{EntityCategory, EntityHandle, EntityInfo, EntitySource};
use crate::schema::geometry::{CompassDirection, Vec3};

/// Grid cell used to decide that two entities share a position.
pub type PositionKey = (i64, i64, i64);

#[derive(Debug, Clone)]
pub struct EntityScanner {
    config: ScannerConfig,
}

impl EntityScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan `handles` around `reference`.
    ///
    /// Unresolvable handles, the reference entity itself, scaffolding and
    /// anything beyond `max_distance` are dropped. Co-located entities
    /// keep only their lowest-rank member (earliest on ties). The result
    /// is sorted by distance, scan order breaking ties.
    pub fn scan(
        &self,
        source: &dyn EntitySource,
        reference: Vec3,
        handles: &[EntityHandle],
        max_distance: f32,
    ) -> Vec<EntityInfo> {
        let mut kept: Vec<EntityInfo> = Vec::new();
        let mut by_cell: FxHashMap<PositionKey, usize> = FxHashMap::default();

        for &handle in handles {
            let snapshot = match source.snapshot(handle) {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(handle = handle.0, error = %e, "entity lookup failed");
                    continue;
                }
            };

            let distance = reference.distance(snapshot.position);
            if distance < self.config.self_exclusion {
                continue;
            }

            let category = self.config.classify(&snapshot.type_tag);
            if !category.is_narratable() {
                continue;
            }

            if distance > max_distance {
                continue;
            }

            let info = EntityInfo {
                handle,
                position: snapshot.position,
                distance,
                type_tag: snapshot.type_tag,
                display_name: snapshot.display_name,
                category,
                is_npc: category.is_npc(),
                is_treasure: category == EntityCategory::Treasure,
            };

            let key = self.position_key(info.position);
            match by_cell.get(&key) {
                Some(&slot) => {
                    if info.category.rank() < kept[slot].category.rank() {
                        tracing::trace!(
                            kept = info.handle.0,
                            dropped = kept[slot].handle.0,
                            "co-located entity replaced"
                        );
                        kept[slot] = info;
                    }
                }
                None => {
                    by_cell.insert(key, kept.len());
                    kept.push(info);
                }
            }
        }

        kept.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        tracing::debug!(found = kept.len(), scanned = handles.len(), "entity scan");
        kept
    }

    /// Quantize a position to the dedup grid.
    pub fn position_key(&self, position: Vec3) -> PositionKey {
        let step = self.config.dedup_tolerance;
        (
            (position.x / step).round() as i64,
            (position.y / step).round() as i64,
            (position.z / step).round() as i64,
        )
    }

    /// Speak at most `report_limit` entries, then a count of the rest.
    pub fn format_report(
        &self,
        translator: &dyn Translator,
        entries: &[EntityInfo],
        radius: f32,
    ) -> String {
        if entries.is_empty() {
            return translator.translate(keys::ENTITY_NONE_WITHIN, &[&format_units(radius)]);
        }

        let limit = self.config.report_limit;
        let mut parts: Vec<String> = entries
            .iter()
            .take(limit)
            .map(|e| {
                translator.translate(
                    keys::ENTITY_AT_DISTANCE,
                    &[&spoken_name(translator, e), &format_units(e.distance)],
                )
            })
            .collect();

        if entries.len() > limit {
            let rest = (entries.len() - limit).to_string();
            parts.push(translator.translate(keys::ENTITY_MORE, &[&rest]));
        }

        let separator = translator.translate(keys::ENTITY_SEPARATOR, &[]);
        parts.join(&separator)
    }

    /// `"<label>, <distance> units <direction>"` from `reference` to the
    /// entity's position as of now.
    pub fn describe_relative(
        &self,
        translator: &dyn Translator,
        reference: Vec3,
        target: Vec3,
        label: &str,
    ) -> String {
        let distance = reference.distance(target);
        if distance < self.config.self_exclusion {
            return translator.translate(keys::ENTITY_HERE, &[label]);
        }
        let direction = CompassDirection::bearing(reference, target);
        let direction = translator.translate(direction.message_key(), &[]);
        translator.translate(
            keys::ENTITY_DIRECTIONAL,
            &[label, &format_units(distance), &direction],
        )
    }
}

/// One decimal place, dropping a trailing `.0`.
pub fn format_units(value: f32) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// The name spoken for an entity: the host's display name when it has
/// one, otherwise the translated category name.
pub fn spoken_name(translator: &dyn Translator, info: &EntityInfo) -> String {
    match &info.display_name {
        Some(name) => name.clone(),
        None => translator.translate(info.category.message_key(), &[]),
    }
}

/// Which categories the entity cycler steps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Npcs,
    Treasure,
    Exits,
    Events,
}

impl CategoryFilter {
    pub fn matches(&self, category: EntityCategory) -> bool {
        match self {
            Self::All => true,
            Self::Npcs => category.is_npc(),
            Self::Treasure => category == EntityCategory::Treasure,
            Self::Exits => matches!(
                category,
                EntityCategory::MapExit | EntityCategory::Teleport
            ),
            Self::Events => matches!(
                category,
                EntityCategory::Event | EntityCategory::InteractiveTrigger
            ),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Npcs,
            Self::Npcs => Self::Treasure,
            Self::Treasure => Self::Exits,
            Self::Exits => Self::Events,
            Self::Events => Self::All,
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            Self::All => "filter.all",
            Self::Npcs => "filter.npcs",
            Self::Treasure => "filter.treasure",
            Self::Exits => "filter.exits",
            Self::Events => "filter.events",
        }
    }
}

/// Steps through the most recent scan one entity at a time.
#[derive(Debug, Clone, Default)]
pub struct EntityCycler {
    entries: Vec<EntityInfo>,
    selected: Option<EntityHandle>,
    filter: CategoryFilter,
}

impl EntityCycler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scan results, keeping the selection if that entity is
    /// still visible through the filter.
    pub fn refresh(&mut self, entries: Vec<EntityInfo>) {
        self.entries = entries;
        if self.selected_position().is_none() {
            self.selected = self.visible().first().map(|e| e.handle);
        }
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Advance to the next filter and select its nearest entity.
    pub fn cycle_filter(&mut self) -> CategoryFilter {
        self.filter = self.filter.next();
        self.selected = self.visible().first().map(|e| e.handle);
        self.filter
    }

    pub fn current(&self) -> Option<&EntityInfo> {
        let handle = self.selected?;
        self.entries
            .iter()
            .find(|e| e.handle == handle && self.filter.matches(e.category))
    }

    pub fn next(&mut self) -> Option<&EntityInfo> {
        self.step(1)
    }

    pub fn previous(&mut self) -> Option<&EntityInfo> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<&EntityInfo> {
        let visible: Vec<EntityHandle> = self.visible().iter().map(|e| e.handle).collect();
        if visible.is_empty() {
            self.selected = None;
            return None;
        }
        let len = visible.len() as isize;
        let next = match self.selected_position() {
            Some(pos) => (pos as isize + delta).rem_euclid(len) as usize,
            None => 0,
        };
        self.selected = Some(visible[next]);
        self.current()
    }

    fn visible(&self) -> Vec<&EntityInfo> {
        self.entries
            .iter()
            .filter(|e| self.filter.matches(e.category))
            .collect()
    }

    fn selected_position(&self) -> Option<usize> {
        let handle = self.selected?;
        self.visible().iter().position(|e| e.handle == handle)
    }

    /// Announce the selected entity with a bearing computed from the
    /// entity's live position.
    pub fn announce(
        &self,
        scanner: &EntityScanner,
        source: &dyn EntitySource,
        translator: &dyn Translator,
        reference: Vec3,
    ) -> String {
        let Some(entry) = self.current() else {
            return translator.translate(keys::ENTITY_NO_SELECTION, &[]);
        };
        match source.snapshot(entry.handle) {
            Ok(Some(live)) => scanner.describe_relative(
                translator,
                reference,
                live.position,
                &spoken_name(translator, entry),
            ),
            Ok(None) => translator.translate(keys::ENTITY_GONE, &[]),
            Err(e) => {
                tracing::warn!(handle = entry.handle.0, error = %e, "entity lookup failed");
                translator.translate(keys::ENTITY_GONE, &[])
            }
        }
    }
}
