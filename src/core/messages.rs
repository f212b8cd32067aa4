/// Message templating: every user-visible string goes through a key.
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

use super::config::ConfigError;

/// Message keys used by the narrator.
pub mod keys {
    pub const NAV_TOP: &str = "nav.top";
    pub const NAV_BOTTOM: &str = "nav.bottom";
    pub const NAV_GROUP: &str = "nav.group";
    pub const NAV_ERROR_READING: &str = "nav.error_reading";
    pub const NAV_NOT_AVAILABLE: &str = "nav.not_available";

    pub const LABEL_COMBINED: &str = "label.combined";
    pub const LABEL_LIST_SEPARATOR: &str = "label.list_separator";

    pub const ENTITY_AT_DISTANCE: &str = "entity.at_distance";
    pub const ENTITY_SEPARATOR: &str = "entity.separator";
    pub const ENTITY_MORE: &str = "entity.more";
    pub const ENTITY_NONE_WITHIN: &str = "entity.none_within";
    pub const ENTITY_DIRECTIONAL: &str = "entity.directional";
    pub const ENTITY_NO_SELECTION: &str = "entity.no_selection";
    pub const ENTITY_GONE: &str = "entity.gone";
    pub const ENTITY_HERE: &str = "entity.here";

    pub const PATH_NO_MOVEMENT: &str = "path.no_movement";
    pub const PATH_SEGMENT: &str = "path.segment";
    pub const PATH_SEPARATOR: &str = "path.separator";
    pub const PATH_NO_PATH: &str = "path.no_path";

    pub const ITEM_STAT: &str = "screen.item.stat";
    pub const ITEM_EQUIP: &str = "screen.item.equip";
    pub const ITEM_EQUIP_NONE: &str = "screen.item.equip_none";
    pub const ITEM_LIST_SEPARATOR: &str = "screen.item.list_separator";
    pub const STATUS_FIELD: &str = "screen.status.field";
    pub const STATUS_EMPTY_SLOT: &str = "screen.status.empty_slot";
}

/// Turns a message key plus positional arguments into display text.
pub trait Translator {
    fn translate(&self, key: &str, args: &[&str]) -> String;
}

/// Key → template table. Templates use positional `{0}`, `{1}`, ...
/// placeholders; `{{` and `}}` are literal braces.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    templates: FxHashMap<String, String>,
}

const ENGLISH: &[(&str, &str)] = &[
    (keys::NAV_TOP, "Top"),
    (keys::NAV_BOTTOM, "Bottom"),
    (keys::NAV_GROUP, "{0}: {1}"),
    (keys::NAV_ERROR_READING, "Error reading"),
    (keys::NAV_NOT_AVAILABLE, "Not available"),
    (keys::LABEL_COMBINED, "{0}: {1}"),
    (keys::LABEL_LIST_SEPARATOR, ", "),
    (keys::ENTITY_AT_DISTANCE, "{0} at {1} units"),
    (keys::ENTITY_SEPARATOR, ", "),
    (keys::ENTITY_MORE, "...and {0} more"),
    (keys::ENTITY_NONE_WITHIN, "No entities within {0} units"),
    (keys::ENTITY_DIRECTIONAL, "{0}, {1} units {2}"),
    (keys::ENTITY_NO_SELECTION, "No entity selected"),
    (keys::ENTITY_GONE, "Entity no longer available"),
    (keys::ENTITY_HERE, "{0}, here"),
    (keys::PATH_NO_MOVEMENT, "No movement"),
    (keys::PATH_SEGMENT, "{0} {1}"),
    (keys::PATH_SEPARATOR, ", "),
    (keys::PATH_NO_PATH, "No path found"),
    ("direction.north", "North"),
    ("direction.north_east", "North east"),
    ("direction.east", "East"),
    ("direction.south_east", "South east"),
    ("direction.south", "South"),
    ("direction.south_west", "South west"),
    ("direction.west", "West"),
    ("direction.north_west", "North west"),
    ("direction.unknown", "Unknown"),
    ("category.map_exit", "Exit"),
    ("category.save_point", "Save point"),
    ("category.treasure", "Treasure"),
    ("category.npc", "NPC"),
    ("category.shop_npc", "Shop"),
    ("category.interactive", "Interactive object"),
    ("category.teleport", "Teleport"),
    ("category.event", "Event"),
    ("category.unclassified", "Object"),
    ("category.scaffolding", "Scaffolding"),
    ("filter.all", "All entities"),
    ("filter.npcs", "NPCs"),
    ("filter.treasure", "Treasure"),
    ("filter.exits", "Exits"),
    ("filter.events", "Events"),
    (keys::ITEM_STAT, "{0} {1}"),
    (keys::ITEM_EQUIP, "Can equip: {0}"),
    (keys::ITEM_EQUIP_NONE, "Nobody can equip this"),
    (keys::ITEM_LIST_SEPARATOR, ", "),
    (keys::STATUS_FIELD, "{0}: {1}"),
    (keys::STATUS_EMPTY_SLOT, "Empty"),
];

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in English catalog.
    pub fn english() -> Self {
        let mut catalog = Self::new();
        for (key, template) in ENGLISH {
            catalog.insert(key, template);
        }
        catalog
    }

    /// Every key the built-in catalog defines.
    pub fn builtin_keys() -> impl Iterator<Item = &'static str> {
        ENGLISH.iter().map(|(k, _)| *k)
    }

    pub fn insert(&mut self, key: &str, template: &str) {
        self.templates.insert(key.to_string(), template.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Load a catalog from a RON map of key to template.
    pub fn load_from_ron(path: &Path) -> Result<MessageCatalog, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<MessageCatalog, ConfigError> {
        let templates: FxHashMap<String, String> = ron::from_str(input)?;
        Ok(MessageCatalog { templates })
    }

    /// Merge another catalog into this one. Entries from `other` win.
    pub fn merge(&mut self, other: MessageCatalog) {
        for (key, template) in other.templates {
            self.templates.insert(key, template);
        }
    }
}

impl Translator for MessageCatalog {
    fn translate(&self, key: &str, args: &[&str]) -> String {
        match self.templates.get(key) {
            Some(template) => render(template, args),
            None => {
                tracing::debug!(key, "missing message template");
                key.to_string()
            }
        }
    }
}

/// Substitute positional arguments into a template. Out-of-range or
/// malformed placeholders are emitted verbatim.
pub fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(&['{', '}'][..]) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find('}') {
            Some(end) => {
                let inner = &tail[1..1 + end];
                match inner.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str(&tail[..end + 2]),
                }
                rest = &tail[end + 2..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Positional indices a template refers to, ignoring escaped braces.
pub fn placeholders(template: &str) -> BTreeSet<usize> {
    let mut found = BTreeSet::new();
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            rest = &tail[2..];
            continue;
        }
        let Some(end) = tail.find('}') else { break };
        if let Ok(index) = tail[1..end].parse::<usize>() {
            found.insert(index);
        }
        rest = &tail[end + 1..];
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_positional() {
        assert_eq!(render("{0} at {1} units", &["NPC", "4.0"]), "NPC at 4.0 units");
        assert_eq!(render("{1}/{0}", &["a", "b"]), "b/a");
    }

    #[test]
    fn render_escapes_and_missing() {
        assert_eq!(render("{{0}}", &["x"]), "{0}");
        assert_eq!(render("{3} left", &["x"]), "{3} left");
        assert_eq!(render("open {brace", &[]), "open {brace");
        assert_eq!(render("{name}", &["x"]), "{name}");
    }

    #[test]
    fn english_catalog_translates() {
        let catalog = MessageCatalog::english();
        assert_eq!(catalog.translate(keys::NAV_TOP, &[]), "Top");
        assert_eq!(
            catalog.translate(keys::ENTITY_MORE, &["3"]),
            "...and 3 more"
        );
        assert_eq!(catalog.translate("direction.north", &[]), "North");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let catalog = MessageCatalog::new();
        assert_eq!(catalog.translate("nav.top", &[]), "nav.top");
    }

    #[test]
    fn placeholder_indices() {
        assert_eq!(placeholders("{0}, {1} units {2}"), BTreeSet::from([0, 1, 2]));
        assert_eq!(placeholders("{{0}} and {1}"), BTreeSet::from([1]));
        assert!(placeholders("Top").is_empty());
        assert!(placeholders("{name}").is_empty());
    }

    #[test]
    fn merge_overrides() {
        let mut base = MessageCatalog::english();
        let overrides = MessageCatalog::parse_ron(r#"{ "nav.top": "Haut" }"#).unwrap();
        base.merge(overrides);
        assert_eq!(base.translate(keys::NAV_TOP, &[]), "Haut");
        assert_eq!(base.translate(keys::NAV_BOTTOM, &[]), "Bottom");
    }
}
