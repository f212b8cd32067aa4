/// Section builders for the detail screens the host exposes.
///
/// Each screen holds a `Weak` reference to the host's record, so the
/// navigator's liveness poll notices when the host drops the screen.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::messages::{keys, Translator};
use super::navigator::{SectionError, SectionSource};

/// One item as the host's item detail view shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    /// Attribute code and bonus, in display order.
    #[serde(default)]
    pub stats: Vec<(u32, i32)>,
    #[serde(default)]
    pub equippable_by: Vec<String>,
}

pub struct ItemDetailScreen {
    item: Weak<ItemRecord>,
    attributes: Rc<BTreeMap<u32, String>>,
}

impl ItemDetailScreen {
    pub const SCREEN_TYPE: &'static str = "item_detail";

    pub fn new(item: &Rc<ItemRecord>, attributes: Rc<BTreeMap<u32, String>>) -> Self {
        Self {
            item: Rc::downgrade(item),
            attributes,
        }
    }
}

/// `+5` / `-3` / `0`.
fn signed(value: i32) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

impl SectionSource for ItemDetailScreen {
    fn is_alive(&self) -> bool {
        self.item.strong_count() > 0
    }

    fn build_sections(&self, translator: &dyn Translator) -> Result<Vec<String>, SectionError> {
        let item = self.item.upgrade().ok_or(SectionError::ContextMissing)?;
        let mut sections = vec![item.name.clone()];

        for &(code, value) in &item.stats {
            match self.attributes.get(&code) {
                Some(name) => {
                    let bonus = signed(value);
                    sections.push(translator.translate(keys::ITEM_STAT, &[name, &bonus]));
                }
                None => tracing::debug!(code, item = %item.name, "unknown attribute code"),
            }
        }

        if item.equippable_by.is_empty() {
            sections.push(translator.translate(keys::ITEM_EQUIP_NONE, &[]));
        } else {
            let separator = translator.translate(keys::ITEM_LIST_SEPARATOR, &[]);
            let who = item.equippable_by.join(&separator);
            sections.push(translator.translate(keys::ITEM_EQUIP, &[&who]));
        }
        Ok(sections)
    }
}

/// Which half of the status screen the host is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusView {
    #[default]
    Stats,
    Equipment,
}

impl StatusView {
    pub fn toggled(self) -> Self {
        match self {
            StatusView::Stats => StatusView::Equipment,
            StatusView::Equipment => StatusView::Stats,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub name: String,
    #[serde(default)]
    pub stats: Vec<(String, String)>,
    /// Slot name and what is in it.
    #[serde(default)]
    pub equipment: Vec<(String, Option<String>)>,
    #[serde(default)]
    pub view: StatusView,
}

impl StatusRecord {
    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
    }
}

/// Character status. The host mutates the record (including the view
/// toggle) in place and asks the navigator to refresh.
pub struct StatusScreen {
    record: Weak<RefCell<StatusRecord>>,
}

impl StatusScreen {
    pub const SCREEN_TYPE: &'static str = "status";

    pub fn new(record: &Rc<RefCell<StatusRecord>>) -> Self {
        Self {
            record: Rc::downgrade(record),
        }
    }
}

impl SectionSource for StatusScreen {
    fn is_alive(&self) -> bool {
        self.record.strong_count() > 0
    }

    fn build_sections(&self, translator: &dyn Translator) -> Result<Vec<String>, SectionError> {
        let record = self.record.upgrade().ok_or(SectionError::ContextMissing)?;
        let record = record
            .try_borrow()
            .map_err(|_| SectionError::ContextMissing)?;

        let mut sections = vec![record.name.clone()];
        match record.view {
            StatusView::Stats => {
                for (label, value) in &record.stats {
                    sections.push(translator.translate(keys::STATUS_FIELD, &[label, value]));
                }
            }
            StatusView::Equipment => {
                let empty = translator.translate(keys::STATUS_EMPTY_SLOT, &[]);
                for (slot, held) in &record.equipment {
                    let held = held.as_deref().unwrap_or(&empty);
                    sections.push(translator.translate(keys::STATUS_FIELD, &[slot, held]));
                }
            }
        }
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::MessageCatalog;
    use crate::core::navigator::{GroupTable, SectionNavigator};

    fn attributes() -> Rc<BTreeMap<u32, String>> {
        Rc::new(BTreeMap::from([
            (1, "Attack".to_string()),
            (2, "Defense".to_string()),
        ]))
    }

    fn sword() -> Rc<ItemRecord> {
        Rc::new(ItemRecord {
            name: "Sword".into(),
            stats: vec![(1, 5)],
            equippable_by: vec!["Terra".into(), "Locke".into()],
        })
    }

    #[test]
    fn item_sections() {
        let catalog = MessageCatalog::english();
        let item = sword();
        let screen = ItemDetailScreen::new(&item, attributes());
        assert_eq!(
            screen.build_sections(&catalog).unwrap(),
            vec!["Sword", "Attack +5", "Can equip: Terra, Locke"]
        );
    }

    #[test]
    fn item_unknown_attribute_and_no_equip() {
        let catalog = MessageCatalog::english();
        let item = Rc::new(ItemRecord {
            name: "Rock".into(),
            stats: vec![(2, -1), (99, 4)],
            equippable_by: vec![],
        });
        let screen = ItemDetailScreen::new(&item, attributes());
        assert_eq!(
            screen.build_sections(&catalog).unwrap(),
            vec!["Rock", "Defense -1", "Nobody can equip this"]
        );
    }

    #[test]
    fn dropped_item_is_context_missing() {
        let catalog = MessageCatalog::english();
        let item = sword();
        let screen = ItemDetailScreen::new(&item, attributes());
        drop(item);
        assert!(!screen.is_alive());
        assert!(matches!(
            screen.build_sections(&catalog),
            Err(SectionError::ContextMissing)
        ));
    }

    fn terra() -> Rc<RefCell<StatusRecord>> {
        Rc::new(RefCell::new(StatusRecord {
            name: "Terra".into(),
            stats: vec![
                ("Level".into(), "12".into()),
                ("HP".into(), "300/420".into()),
                ("Vigor".into(), "31".into()),
            ],
            equipment: vec![
                ("Weapon".into(), Some("Mithril Knife".into())),
                ("Shield".into(), None),
            ],
            view: StatusView::Stats,
        }))
    }

    #[test]
    fn status_views() {
        let catalog = MessageCatalog::english();
        let record = terra();
        let screen = StatusScreen::new(&record);
        assert_eq!(
            screen.build_sections(&catalog).unwrap(),
            vec!["Terra", "Level: 12", "HP: 300/420", "Vigor: 31"]
        );
        record.borrow_mut().toggle_view();
        assert_eq!(
            screen.build_sections(&catalog).unwrap(),
            vec!["Terra", "Weapon: Mithril Knife", "Shield: Empty"]
        );
    }

    #[test]
    fn toggle_then_refresh_clamps_cursor() {
        let catalog = MessageCatalog::english();
        let record = terra();
        let mut nav = SectionNavigator::new();
        nav.open(
            Box::new(StatusScreen::new(&record)),
            GroupTable::single("Status"),
            &catalog,
        )
        .unwrap();
        nav.jump_bottom(&catalog);
        assert_eq!(nav.index(), Some(3));

        record.borrow_mut().toggle_view();
        nav.refresh(&catalog).unwrap();
        assert_eq!(nav.index(), Some(2));
        assert_eq!(nav.repeat(&catalog).as_deref(), Some("Shield: Empty"));
    }

    #[test]
    fn closing_host_screen_ends_session() {
        let catalog = MessageCatalog::english();
        let record = terra();
        let mut nav = SectionNavigator::new();
        nav.open(
            Box::new(StatusScreen::new(&record)),
            GroupTable::single("Status"),
            &catalog,
        )
        .unwrap();
        drop(record);
        assert_eq!(nav.next(&catalog), None);
        assert!(!nav.is_open());
    }
}
