/// Config Linter: validates narration tables and message catalogs.
///
/// Usage: config_linter <config.ron> [--messages <file_or_dir>]

use scene_narrator::core::config::NarrationConfig;
use scene_narrator::core::messages::{placeholders, MessageCatalog};
use scene_narrator::core::screens::{ItemDetailScreen, StatusScreen};
use scene_narrator::schema::entity::EntityCategory;
use std::collections::BTreeSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: config_linter <config.ron> [--messages <file_or_dir>]");
        process::exit(0);
    }

    let config_path = &args[1];
    let mut messages_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--messages" && i + 1 < args.len() {
            i += 1;
            messages_path = Some(args[i].clone());
        }
        i += 1;
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // A config that fails validation still gets linted when it parses.
    let config = match NarrationConfig::load_from_ron(Path::new(config_path)) {
        Ok(config) => Some(config),
        Err(e) => {
            errors.push(format!("{}: {}", config_path, e));
            std::fs::read_to_string(config_path)
                .ok()
                .and_then(|s| ron::from_str::<NarrationConfig>(&s).ok())
        }
    };

    if let Some(ref config) = config {
        println!("Loaded config: {}", config_path);
        lint_config(config, &mut errors, &mut warnings);
    }

    if let Some(ref path) = messages_path {
        let mut catalog = MessageCatalog::new();
        load_catalogs(Path::new(path), &mut catalog, &mut errors);
        println!("Loaded {} message templates", catalog.len());
        lint_messages(&catalog, &mut errors, &mut warnings);
    }

    // Print report
    println!("\n=== Config Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_catalogs(path: &Path, catalog: &mut MessageCatalog, errors: &mut Vec<String>) {
    if path.is_file() {
        match MessageCatalog::load_from_ron(path) {
            Ok(c) => catalog.merge(c),
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    } else if path.is_dir() {
        let mut files: Vec<_> = std::fs::read_dir(path)
            .map(|entries| entries.flatten().map(|e| e.path()).collect())
            .unwrap_or_default();
        files.sort();
        for file in files {
            if file.extension().and_then(|s| s.to_str()) == Some("ron") {
                println!("  Loaded: {}", file.display());
                load_catalogs(&file, catalog, errors);
            }
        }
    } else {
        errors.push(format!("Path '{}' does not exist", path.display()));
    }
}

fn lint_config(config: &NarrationConfig, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let resolver = &config.resolver;

    for name in &resolver.remap_containers {
        if resolver.list_containers.contains(name) {
            warnings.push(format!(
                "container '{}' is both a list and a remap container; the list strategy will claim it",
                name
            ));
        }
    }

    let mut seen = BTreeSet::new();
    for placeholder in &resolver.placeholders {
        let normalized = placeholder.trim().to_lowercase();
        if normalized.is_empty() {
            warnings.push("empty placeholder entry (blank text is always rejected)".to_string());
        } else if !seen.insert(normalized) {
            warnings.push(format!("duplicate placeholder '{}'", placeholder));
        }
    }

    if resolver.max_ancestor_depth > 64 {
        warnings.push(format!(
            "max_ancestor_depth {} is unusually deep",
            resolver.max_ancestor_depth
        ));
    }

    if config.scanner.dedup_tolerance > 1.0 {
        warnings.push(format!(
            "dedup_tolerance {} may merge entities that are visibly apart",
            config.scanner.dedup_tolerance
        ));
    }

    let narratable = config
        .scanner
        .type_table
        .values()
        .filter(|c| c.is_narratable())
        .count();
    if narratable == 0 {
        errors.push("type_table has no narratable categories; every scan will be empty".to_string());
    }
    for (tag, category) in &config.scanner.type_table {
        if *category == EntityCategory::Unclassified {
            warnings.push(format!(
                "type tag '{}' is mapped to Unclassified explicitly; unmapped tags already are",
                tag
            ));
        }
    }

    let path = &config.path;
    if !(0.0..1.0).contains(&path.diagonal_threshold) {
        errors.push(format!(
            "path.diagonal_threshold {} must be in [0, 1)",
            path.diagonal_threshold
        ));
    }
    if path.merge_threshold <= 0.0 {
        warnings.push("path.merge_threshold <= 0 never merges steps".to_string());
    }

    for screen in [ItemDetailScreen::SCREEN_TYPE, StatusScreen::SCREEN_TYPE] {
        if config.screen(screen).is_none() {
            warnings.push(format!(
                "no group table for screen '{}'; it will use a single group",
                screen
            ));
        }
    }

    if config.attributes.is_empty() {
        warnings.push("attribute table is empty; item stat lines will be skipped".to_string());
    }
}

fn lint_messages(catalog: &MessageCatalog, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let english = MessageCatalog::english();
    let builtin: BTreeSet<&str> = MessageCatalog::builtin_keys().collect();

    for key in &builtin {
        let Some(template) = catalog.get(key) else {
            warnings.push(format!("missing key '{}' (English text will be used)", key));
            continue;
        };
        let expected = english.get(key).map(placeholders).unwrap_or_default();
        let used = placeholders(template);
        for index in used.difference(&expected) {
            errors.push(format!(
                "'{}' uses {{{}}} but only {:?} are supplied",
                key, index, expected
            ));
        }
        for index in expected.difference(&used) {
            warnings.push(format!("'{}' never shows argument {{{}}}", key, index));
        }
    }

    for key in catalog.keys() {
        if !builtin.contains(key) {
            warnings.push(format!("unknown key '{}'", key));
        }
    }
}
