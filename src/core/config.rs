/// Configuration tables: immutable data handed to each component at
/// construction, loaded from RON.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::navigator::GroupTable;
use crate::schema::entity::EntityCategory;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Structural assumptions the label resolver makes about the host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on ancestor walks.
    pub max_ancestor_depth: usize,
    /// Container names that mark an indexed options list.
    pub list_containers: Vec<String>,
    /// Name of the node under a list container holding one child per option.
    pub content_node: String,
    /// Field names checked for an option's label, in order.
    pub label_fields: Vec<String>,
    /// Field names checked for an option's current value, in order.
    pub value_fields: Vec<String>,
    /// Child names identifying the icon half of an icon+text widget.
    pub icon_fields: Vec<String>,
    /// Child name carrying the text half of an icon+text widget.
    pub icon_label_field: String,
    /// Container names handled by the key-remapping reader.
    pub remap_containers: Vec<String>,
    /// Case-insensitive texts that are never narrated.
    pub placeholders: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 10,
            list_containers: vec!["option_list".to_string(), "config_list".to_string()],
            content_node: "Content".to_string(),
            label_fields: vec!["title_text".to_string(), "name_text".to_string()],
            value_fields: vec![
                "slider_value_text".to_string(),
                "value_text".to_string(),
                "dropdown_label".to_string(),
            ],
            icon_fields: vec!["icon".to_string(), "icon_image".to_string()],
            icon_label_field: "text".to_string(),
            remap_containers: vec!["key_config_list".to_string()],
            placeholders: vec![
                "new text".to_string(),
                "text".to_string(),
                "button".to_string(),
                "label".to_string(),
                "placeholder".to_string(),
            ],
        }
    }
}

/// Spatial scan tuning and the type tag → category table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Entities closer than this to the reference are the reference itself.
    pub self_exclusion: f32,
    /// Quantization step used to group co-located entities.
    pub dedup_tolerance: f32,
    /// Maximum entries spoken by the bounded report.
    pub report_limit: usize,
    pub type_table: FxHashMap<String, EntityCategory>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let type_table = [
            ("MapExit", EntityCategory::MapExit),
            ("GotoMapEntity", EntityCategory::MapExit),
            ("SavePointEntity", EntityCategory::SavePoint),
            ("TreasureBoxEntity", EntityCategory::Treasure),
            ("NonPlayerEntity", EntityCategory::Npc),
            ("ShopNpcEntity", EntityCategory::ShopNpc),
            ("PropertyEntity", EntityCategory::InteractiveTrigger),
            ("TeleportEntity", EntityCategory::Teleport),
            ("EventTriggerEntity", EntityCategory::Event),
            ("ScriptEventEntity", EntityCategory::Event),
            ("ColliderEntity", EntityCategory::Scaffolding),
            ("VisualEffectEntity", EntityCategory::Scaffolding),
            ("AreaTriggerEntity", EntityCategory::Scaffolding),
        ]
        .into_iter()
        .map(|(tag, category)| (tag.to_string(), category))
        .collect();

        Self {
            self_exclusion: 0.1,
            dedup_tolerance: 0.1,
            report_limit: 5,
            type_table,
        }
    }
}

impl ScannerConfig {
    /// Category for a type tag; tags missing from the table are
    /// `Unclassified`.
    pub fn classify(&self, type_tag: &str) -> EntityCategory {
        self.type_table
            .get(type_tag)
            .copied()
            .unwrap_or(EntityCategory::Unclassified)
    }
}

/// Thresholds for turning waypoint steps into compass runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub diagonal_threshold: f32,
    pub merge_threshold: f32,
    pub negligible: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            diagonal_threshold: 0.4,
            merge_threshold: 0.1,
            negligible: 1e-3,
        }
    }
}

/// Everything the narrator needs that is data rather than code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub resolver: ResolverConfig,
    pub scanner: ScannerConfig,
    pub path: PathConfig,
    /// Screen type → group boundaries for section navigation.
    pub screens: BTreeMap<String, GroupTable>,
    /// Attribute code → display name for item stat lines.
    pub attributes: BTreeMap<u32, String>,
}

impl NarrationConfig {
    pub fn load_from_ron(path: &Path) -> Result<NarrationConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<NarrationConfig, ConfigError> {
        let config: NarrationConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_ancestor_depth == 0 {
            return Err(ConfigError::Invalid(
                "resolver.max_ancestor_depth must be at least 1".to_string(),
            ));
        }
        if self.resolver.content_node.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resolver.content_node must not be empty".to_string(),
            ));
        }
        let tolerance = self.scanner.dedup_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(ConfigError::Invalid(
                "scanner.dedup_tolerance must be positive".to_string(),
            ));
        }
        if self.scanner.self_exclusion < 0.0 {
            return Err(ConfigError::Invalid(
                "scanner.self_exclusion must not be negative".to_string(),
            ));
        }
        if self.scanner.report_limit == 0 {
            return Err(ConfigError::Invalid(
                "scanner.report_limit must be at least 1".to_string(),
            ));
        }
        for (screen, table) in &self.screens {
            table
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("screen '{}': {}", screen, e)))?;
        }
        Ok(())
    }

    pub fn screen(&self, screen_type: &str) -> Option<&GroupTable> {
        self.screens.get(screen_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NarrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolver.max_ancestor_depth, 10);
        assert_eq!(config.scanner.report_limit, 5);
    }

    #[test]
    fn classify_unknown_tag_is_unclassified() {
        let config = ScannerConfig::default();
        assert_eq!(config.classify("NonPlayerEntity"), EntityCategory::Npc);
        assert_eq!(
            config.classify("SomethingNew"),
            EntityCategory::Unclassified
        );
        assert_eq!(
            config.classify("ColliderEntity"),
            EntityCategory::Scaffolding
        );
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = NarrationConfig::parse_ron(
            r#"(
                scanner: (report_limit: 3),
                screens: {
                    "item": (starts: [0, 1, 3], names: ["Name", "Stats", "Equip"]),
                },
            )"#,
        )
        .unwrap();
        assert_eq!(config.scanner.report_limit, 3);
        assert!((config.scanner.dedup_tolerance - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.screen("item").unwrap().starts, vec![0, 1, 3]);
        assert_eq!(config.resolver.content_node, "Content");
    }

    #[test]
    fn unsorted_group_table_rejected() {
        let err = NarrationConfig::parse_ron(
            r#"(screens: { "bad": (starts: [0, 4, 2], names: ["a", "b", "c"]) })"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_tolerance_rejected() {
        let mut config = NarrationConfig::default();
        config.scanner.dedup_tolerance = 0.0;
        assert!(config.validate().is_err());
    }
}
