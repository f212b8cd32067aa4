/// Section navigation over item screens and random input sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_narrator::core::messages::{MessageCatalog, Translator};
use scene_narrator::core::navigator::{
    GroupTable, NavInput, SectionError, SectionNavigator, SectionSource,
};
use scene_narrator::core::screens::{ItemDetailScreen, ItemRecord};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn attributes() -> Rc<BTreeMap<u32, String>> {
    Rc::new(BTreeMap::from([
        (1, "Attack".to_string()),
        (2, "Defense".to_string()),
    ]))
}

fn sword() -> Rc<ItemRecord> {
    Rc::new(ItemRecord {
        name: "Sword".to_string(),
        stats: vec![(1, 5)],
        equippable_by: vec!["Terra".to_string(), "Locke".to_string()],
    })
}

#[test]
fn sword_end_to_end() {
    let catalog = MessageCatalog::english();
    let item = sword();
    let mut nav = SectionNavigator::new();

    let first = nav
        .open(
            Box::new(ItemDetailScreen::new(&item, attributes())),
            GroupTable::single("Item"),
            &catalog,
        )
        .unwrap();
    assert_eq!(first, "Sword");

    let spoken: Vec<String> = [NavInput::Next, NavInput::Next, NavInput::Previous]
        .into_iter()
        .filter_map(|input| nav.handle(input, &catalog))
        .collect();
    assert_eq!(
        spoken,
        vec!["Attack +5", "Can equip: Terra, Locke", "Attack +5"]
    );
}

#[test]
fn bottom_marker_then_group_wrap() {
    let catalog = MessageCatalog::english();
    let item = Rc::new(ItemRecord {
        name: "Ribbon".to_string(),
        stats: vec![(1, 1), (2, 3)],
        equippable_by: vec![],
    });
    let groups = GroupTable {
        starts: vec![0, 1, 3],
        names: vec!["Name".to_string(), "Stats".to_string(), "Equip".to_string()],
    };
    let mut nav = SectionNavigator::new();
    nav.open(Box::new(ItemDetailScreen::new(&item, attributes())), groups, &catalog)
        .unwrap();

    assert_eq!(
        nav.handle(NavInput::Bottom, &catalog).as_deref(),
        Some("Nobody can equip this")
    );
    assert_eq!(nav.handle(NavInput::Next, &catalog).as_deref(), Some("Bottom"));
    assert_eq!(nav.index(), Some(3));

    assert_eq!(
        nav.handle(NavInput::NextGroup, &catalog).as_deref(),
        Some("Name: Ribbon")
    );
    assert_eq!(nav.index(), Some(0));
    assert_eq!(
        nav.handle(NavInput::PreviousGroup, &catalog).as_deref(),
        Some("Equip: Nobody can equip this")
    );
    assert_eq!(
        nav.handle(NavInput::PreviousGroup, &catalog).as_deref(),
        Some("Stats: Attack +1")
    );
}

/// Sections owned by the test, so it can grow and shrink them.
struct Scripted {
    sections: Rc<RefCell<Vec<String>>>,
}

impl SectionSource for Scripted {
    fn is_alive(&self) -> bool {
        true
    }

    fn build_sections(&self, _translator: &dyn Translator) -> Result<Vec<String>, SectionError> {
        Ok(self.sections.borrow().clone())
    }
}

fn numbered(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Section {}", i)).collect()
}

#[test]
fn shrinking_refresh_clamps() {
    let catalog = MessageCatalog::english();
    let sections = Rc::new(RefCell::new(numbered(6)));
    let mut nav = SectionNavigator::new();
    nav.open(
        Box::new(Scripted {
            sections: Rc::clone(&sections),
        }),
        GroupTable::single("All"),
        &catalog,
    )
    .unwrap();
    nav.jump_bottom(&catalog);
    assert_eq!(nav.index(), Some(5));

    *sections.borrow_mut() = numbered(2);
    nav.refresh(&catalog).unwrap();
    assert_eq!(nav.index(), Some(1));
    assert_eq!(nav.repeat(&catalog).as_deref(), Some("Section 1"));

    sections.borrow_mut().clear();
    assert!(matches!(nav.refresh(&catalog), Err(SectionError::Empty)));
    assert!(!nav.is_open());
}

const INPUTS: [NavInput; 7] = [
    NavInput::Next,
    NavInput::Previous,
    NavInput::NextGroup,
    NavInput::PreviousGroup,
    NavInput::Top,
    NavInput::Bottom,
    NavInput::Repeat,
];

#[test]
fn random_inputs_keep_index_in_bounds() {
    let mut rng = StdRng::seed_from_u64(31);
    let catalog = MessageCatalog::english();

    for _ in 0..100 {
        let sections = Rc::new(RefCell::new(numbered(rng.gen_range(1..12))));
        let mut starts = vec![0];
        for s in 1..15 {
            if rng.gen_bool(0.3) {
                starts.push(s);
            }
        }
        let names = starts.iter().map(|s| format!("G{}", s)).collect();
        let groups = GroupTable { starts, names };
        assert!(groups.validate().is_ok());

        let mut nav = SectionNavigator::new();
        nav.open(
            Box::new(Scripted {
                sections: Rc::clone(&sections),
            }),
            groups,
            &catalog,
        )
        .unwrap();

        for _ in 0..60 {
            if rng.gen_bool(0.1) {
                *sections.borrow_mut() = numbered(rng.gen_range(1..12));
                nav.refresh(&catalog).unwrap();
            } else {
                let input = INPUTS[rng.gen_range(0..INPUTS.len())];
                let spoken = nav.handle(input, &catalog);
                assert!(spoken.is_some());
                assert_ne!(spoken.as_deref(), Some("Error reading"));
            }
            let len = sections.borrow().len();
            let index = nav.index().unwrap();
            assert!(index < len, "index {} out of {}", index, len);
        }
    }
}

#[test]
fn dropped_item_ends_session() {
    let catalog = MessageCatalog::english();
    let item = sword();
    let mut nav = SectionNavigator::new();
    nav.open(
        Box::new(ItemDetailScreen::new(&item, attributes())),
        GroupTable::single("Item"),
        &catalog,
    )
    .unwrap();

    drop(item);
    assert_eq!(nav.handle(NavInput::Next, &catalog), None);
    assert!(!nav.is_open());
}
