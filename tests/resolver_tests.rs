/// Label resolution against a fixture menu and randomly generated trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_narrator::core::config::ResolverConfig;
use scene_narrator::core::filter::PlaceholderFilter;
use scene_narrator::core::messages::MessageCatalog;
use scene_narrator::core::resolver::{
    IndexedListEntry, KeyBindingReader, LabelStrategy, SubtreeText, TextResolver,
};
use scene_narrator::schema::scene::{FocusContext, NodeId, SceneTree};
use std::path::Path;

fn menu() -> SceneTree {
    SceneTree::load_from_ron(Path::new("tests/fixtures/menu_scene.ron")).unwrap()
}

fn node(tree: &SceneTree, name: &str) -> NodeId {
    tree.find_by_name(name)
        .unwrap_or_else(|| panic!("fixture has no node named {}", name))
}

fn resolve(resolver: &TextResolver, tree: &SceneTree, name: &str, index: usize) -> Option<String> {
    resolver.resolve_label(
        tree,
        &MessageCatalog::english(),
        &FocusContext::new(node(tree, name), index),
    )
}

#[test]
fn fixture_scene_loads() {
    let tree = menu();
    assert!(tree.len() > 20);
    let main = node(&tree, "MainMenu");
    assert!(tree.get(main).unwrap().position.is_some());
}

#[test]
fn plain_button() {
    let resolver = TextResolver::new(ResolverConfig::default());
    assert_eq!(resolve(&resolver, &menu(), "ItemsButton", 0).as_deref(), Some("Items"));
}

#[test]
fn options_list_rows_follow_index() {
    let resolver = TextResolver::new(ResolverConfig::default());
    let tree = menu();
    assert_eq!(
        resolve(&resolver, &tree, "Cursor", 0).as_deref(),
        Some("Music volume: 80")
    );
    // Row1 is inactive, so index 1 is the next visible row.
    assert_eq!(
        resolve(&resolver, &tree, "Cursor", 1).as_deref(),
        Some("Battle speed: 3")
    );
    assert_eq!(
        resolve(&resolver, &tree, "Cursor", 2).as_deref(),
        Some("Reset to defaults")
    );
}

#[test]
fn list_strategy_wins_over_subtree_fallback() {
    let tree = menu();
    let focus = FocusContext::new(node(&tree, "Cursor"), 0);
    let catalog = MessageCatalog::english();

    let full = TextResolver::new(ResolverConfig::default());
    let list_only = TextResolver::with_strategies(
        ResolverConfig::default(),
        vec![Box::new(IndexedListEntry) as Box<dyn LabelStrategy>],
    );
    let fallback_only = TextResolver::with_strategies(
        ResolverConfig::default(),
        vec![Box::new(SubtreeText) as Box<dyn LabelStrategy>],
    );

    let fallback = fallback_only.resolve_label(&tree, &catalog, &focus);
    assert_eq!(fallback.as_deref(), Some("Music volume"));
    assert_eq!(
        full.resolve_label(&tree, &catalog, &focus),
        list_only.resolve_label(&tree, &catalog, &focus)
    );
}

#[test]
fn remap_panel_only_with_reader() {
    let tree = menu();
    let plain = TextResolver::new(ResolverConfig::default());
    let with_reader = TextResolver::with_remap_reader(
        ResolverConfig::default(),
        Box::new(KeyBindingReader::default()),
    );

    assert_eq!(resolve(&plain, &tree, "KeyCursor", 0).as_deref(), Some("Confirm"));
    assert_eq!(
        resolve(&with_reader, &tree, "KeyCursor", 0).as_deref(),
        Some("Confirm: Z, Enter")
    );
    assert_eq!(
        with_reader.strategy_names(),
        vec![
            "ancestor_direct_text",
            "indexed_list",
            "icon_label_widget",
            "remap_panel",
            "subtree_text"
        ]
    );
}

#[test]
fn icon_text_command() {
    let resolver = TextResolver::new(ResolverConfig::default());
    assert_eq!(resolve(&resolver, &menu(), "CommandButton", 0).as_deref(), Some("Fight"));
}

#[test]
fn placeholder_stub_falls_through_to_real_text() {
    let resolver = TextResolver::new(ResolverConfig::default());
    assert_eq!(resolve(&resolver, &menu(), "Stub", 0).as_deref(), Some("Press start"));
}

#[test]
fn unresolvable_focus_is_none() {
    let mut tree = SceneTree::new();
    let root = tree.add_root("Empty");
    let child = tree.add_child(root, "Child");
    tree.set_text(child, "text", "  ");
    let resolver = TextResolver::new(ResolverConfig::default());
    let label = resolver.resolve_label(
        &tree,
        &MessageCatalog::english(),
        &FocusContext::new(child, 0),
    );
    assert_eq!(label, None);
}

#[test]
fn stale_focus_is_none() {
    let tree = menu();
    let resolver = TextResolver::new(ResolverConfig::default());
    let label = resolver.resolve_label(
        &tree,
        &MessageCatalog::english(),
        &FocusContext::new(NodeId(9999), 0),
    );
    assert_eq!(label, None);
}

const TEXT_POOL: &[&str] = &[
    "Potion",
    "new text",
    "NEW TEXT",
    "  Button ",
    "",
    "   ",
    "Label",
    "Ether",
    "placeholder",
    "Text",
    "Phoenix Down",
];

const NAME_POOL: &[&str] = &[
    "Row",
    "option_list",
    "Content",
    "title_text",
    "slider_value_text",
    "icon",
    "text",
    "key_config_list",
    "Panel",
];

fn random_tree(rng: &mut StdRng) -> SceneTree {
    let mut tree = SceneTree::new();
    let root = tree.add_root(NAME_POOL[rng.gen_range(0..NAME_POOL.len())]);
    let mut nodes = vec![root];
    for _ in 0..rng.gen_range(1..40) {
        let parent = nodes[rng.gen_range(0..nodes.len())];
        let id = tree.add_child(parent, NAME_POOL[rng.gen_range(0..NAME_POOL.len())]);
        for role in ["text", "value", "shadow"] {
            if rng.gen_bool(0.3) {
                tree.set_text(id, role, TEXT_POOL[rng.gen_range(0..TEXT_POOL.len())]);
            }
        }
        if rng.gen_bool(0.1) {
            tree.set_active(id, false);
        }
        nodes.push(id);
    }
    tree
}

#[test]
fn never_emits_placeholder_text() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let config = ResolverConfig::default();
    let filter = PlaceholderFilter::new(&config.placeholders);
    let resolver = TextResolver::with_remap_reader(config, Box::new(KeyBindingReader::default()));
    let catalog = MessageCatalog::english();

    for _ in 0..300 {
        let tree = random_tree(&mut rng);
        for _ in 0..5 {
            let focus = FocusContext::new(
                NodeId(rng.gen_range(0..tree.len() as u32)),
                rng.gen_range(0..4),
            );
            if let Some(label) = resolver.resolve_label(&tree, &catalog, &focus) {
                assert!(!label.trim().is_empty());
                assert!(!filter.is_placeholder(&label), "leaked {:?}", label);
                // Combined labels must not hide a placeholder half either.
                for part in label.split(": ") {
                    assert!(!filter.is_placeholder(part), "leaked {:?} in {:?}", part, label);
                }
            }
        }
    }
}

#[test]
fn list_strategy_always_beats_fallback_on_random_lists() {
    let mut rng = StdRng::seed_from_u64(42);
    let catalog = MessageCatalog::english();
    let full = TextResolver::new(ResolverConfig::default());
    let list_only = TextResolver::with_strategies(
        ResolverConfig::default(),
        vec![Box::new(IndexedListEntry) as Box<dyn LabelStrategy>],
    );

    for _ in 0..100 {
        let mut tree = SceneTree::new();
        let list = tree.add_root("config_list");
        let cursor = tree.add_child(list, "Cursor");
        let content = tree.add_child(list, "Content");
        let rows = rng.gen_range(1..8);
        for r in 0..rows {
            let row = tree.add_child(content, "Row");
            let title = tree.add_child(row, "name_text");
            tree.set_text(title, "text", &format!("Option {}", r));
            if rng.gen_bool(0.5) {
                let value = tree.add_child(row, "value_text");
                tree.set_text(value, "text", &format!("{}", rng.gen_range(0..100)));
            }
        }

        let focus = FocusContext::new(cursor, rng.gen_range(0..rows));
        let expected = list_only.resolve_label(&tree, &catalog, &focus);
        assert!(expected.is_some());
        assert_eq!(full.resolve_label(&tree, &catalog, &focus), expected);
    }
}
