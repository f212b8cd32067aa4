/// Preview: interactive narration shell over a RON scene.
///
/// Usage: preview --scene <path> [--config <path>] [--messages <dir>] [--seed <n>]
///
/// Commands:
///   nodes                         list scene nodes
///   focus <node> [index]          move the cursor, narrated on the next tick
///   label <node> [index]          resolve a label immediately
///   pos <x> <y> [z]               set the player position
///   scatter <n> [radius]          place n random entities around the player
///   scan [radius]                 announce nearby entities
///   next / prev                   cycle the selected entity
///   filter                        cycle the entity category filter
///   route                         straight-line route to the selected entity
///   path <x,y> <x,y> ...          describe a waypoint path
///   item <name> [a:v,...] [who,...]   open an item detail screen
///   nav <input>                   next, previous, next_group, previous_group, top, bottom, repeat
///   close                         drop the open item
///   help                          list commands
///   quit                          exit

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_narrator::core::config::NarrationConfig;
use scene_narrator::core::deferred::{CursorId, FocusProvider};
use scene_narrator::core::navigator::NavInput;
use scene_narrator::core::path::Pathfinder;
use scene_narrator::core::pipeline::{Cycle, NarrationSink, Narrator};
use scene_narrator::core::resolver::KeyBindingReader;
use scene_narrator::core::screens::ItemRecord;
use scene_narrator::schema::entity::{EntityHandle, EntitySnapshot, EntityTable};
use scene_narrator::schema::geometry::Vec3;
use scene_narrator::schema::scene::{AccessError, FocusContext, NodeId, SceneTree};
use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Prints speech to stdout.
struct ConsoleSink;

impl NarrationSink for ConsoleSink {
    fn speak(&mut self, text: &str, interrupt: bool) {
        if interrupt {
            println!("  >> {}", text);
        } else {
            println!("  >  {}", text);
        }
    }
}

/// The shell's single cursor.
struct ShellCursor(Cell<Option<FocusContext>>);

impl FocusProvider for ShellCursor {
    fn current_focus(&self, _cursor: CursorId) -> Result<Option<FocusContext>, AccessError> {
        Ok(self.0.get())
    }
}

/// Routes in a straight line; the shell has no navigation mesh.
struct StraightLine;

impl Pathfinder for StraightLine {
    fn find_path(&self, from: Vec3, to: Vec3) -> Result<Option<Vec<Vec3>>, AccessError> {
        Ok(Some(vec![from, to]))
    }
}

/// Tables used when no `--config` is given.
const DEFAULT_CONFIG: &str = include_str!("../assets/narration.ron");

const ENTITY_TAGS: &[&str] = &[
    "MapExit",
    "SavePointEntity",
    "TreasureBoxEntity",
    "NonPlayerEntity",
    "ShopNpcEntity",
    "PropertyEntity",
    "TeleportEntity",
    "EventTriggerEntity",
    "ColliderEntity",
    "VisualEffectEntity",
];

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut scene_path = None;
    let mut config_path = None;
    let mut messages_dir = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scene" if i + 1 < args.len() => {
                i += 1;
                scene_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--messages" if i + 1 < args.len() => {
                i += 1;
                messages_dir = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let scene = match scene_path {
        Some(ref path) => match SceneTree::load_from_ron(Path::new(path)) {
            Ok(tree) => tree,
            Err(e) => {
                eprintln!("ERROR loading scene {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SceneTree::new(),
    };

    let mut builder = Narrator::builder().with_remap_reader(Box::new(KeyBindingReader::default()));
    if let Some(ref path) = config_path {
        builder = builder.config_file(path);
    } else {
        match NarrationConfig::parse_ron(DEFAULT_CONFIG) {
            Ok(config) => builder = builder.with_config(config),
            Err(e) => {
                eprintln!("ERROR in built-in config: {}", e);
                std::process::exit(1);
            }
        }
    }
    if let Some(ref dir) = messages_dir {
        builder = builder.messages_dir(dir);
    }
    let mut narrator = match builder.build() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("ERROR building narrator: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} scene nodes", scene.len());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    // Session state
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sink = ConsoleSink;
    let cursor = ShellCursor(Cell::new(None));
    let mut player = Vec3::ZERO;
    let mut entities = EntityTable::new();
    let mut next_handle: u64 = 1;
    let mut item: Option<Rc<ItemRecord>> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "nodes" => {
                for id in 0..scene.len() as u32 {
                    let Some(node) = scene.get(NodeId(id)) else { continue };
                    let texts: Vec<String> = node
                        .texts
                        .iter()
                        .map(|t| format!("{}={:?}", t.role, t.text))
                        .collect();
                    println!(
                        "  {} {}{} [{}]",
                        NodeId(id),
                        node.name,
                        if node.active { "" } else { " (inactive)" },
                        texts.join(", ")
                    );
                }
            }
            "focus" | "label" => {
                let Some(focus) = parse_focus(&scene, &parts) else {
                    println!("Usage: {} <node id or name> [index]", cmd);
                    continue;
                };
                if cmd == "label" {
                    match narrator.resolve_label(&scene, &focus) {
                        Some(text) => println!("  label: {}", text),
                        None => println!("  (no label)"),
                    }
                } else {
                    narrator.cursor_moved(CursorId(0));
                    cursor.0.set(Some(focus));
                    if narrator.tick(&scene, &cursor, &mut sink) == 0 {
                        println!("  (silent)");
                    }
                }
            }
            "pos" => {
                let coords: Vec<f32> = parts[1..].iter().filter_map(|p| p.parse().ok()).collect();
                if coords.len() < 2 {
                    println!("Usage: pos <x> <y> [z]");
                    continue;
                }
                player = Vec3::new(coords[0], coords[1], coords.get(2).copied().unwrap_or(0.0));
                println!("Player at {}", player);
            }
            "scatter" => {
                let count: usize = match parts.get(1).and_then(|p| p.parse().ok()) {
                    Some(n) if n > 0 => n,
                    _ => {
                        println!("Usage: scatter <n> [radius]");
                        continue;
                    }
                };
                let radius: f32 = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(20.0);
                for _ in 0..count {
                    let tag = ENTITY_TAGS[rng.gen_range(0..ENTITY_TAGS.len())];
                    let offset = Vec3::new(
                        rng.gen_range(-radius..=radius).round(),
                        rng.gen_range(-radius..=radius).round(),
                        0.0,
                    );
                    let handle = EntityHandle(next_handle);
                    next_handle += 1;
                    entities.insert(
                        handle,
                        EntitySnapshot {
                            type_tag: tag.to_string(),
                            position: player + offset,
                            display_name: None,
                        },
                    );
                    println!("  #{} {} at {}", handle.0, tag, player + offset);
                }
            }
            "scan" => {
                let radius: f32 = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(30.0);
                let handles = entities.handles();
                narrator.announce_nearby(&entities, player, &handles, radius, &mut sink);
            }
            "next" => narrator.cycle_entity(Cycle::Next, &entities, player, &mut sink),
            "prev" => narrator.cycle_entity(Cycle::Previous, &entities, player, &mut sink),
            "filter" => {
                narrator.cycle_filter(&mut sink);
            }
            "route" => {
                narrator.route_to_selected(&StraightLine, &entities, player, &mut sink);
            }
            "path" => {
                let waypoints: Vec<Vec3> = parts[1..].iter().filter_map(|p| parse_point(p)).collect();
                narrator.describe_path(&waypoints, &mut sink);
            }
            "item" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: item <name> [attr:value,...] [who,...]");
                    continue;
                };
                let stats = parts.get(2).map(|s| parse_stats(s)).unwrap_or_default();
                let equippable_by = parts
                    .get(3)
                    .map(|s| s.split(',').map(str::to_string).collect())
                    .unwrap_or_default();
                let record = Rc::new(ItemRecord {
                    name: name.replace('_', " "),
                    stats,
                    equippable_by,
                });
                if !narrator.open_item(&record, &mut sink) {
                    println!("  (nothing to read)");
                }
                item = Some(record);
            }
            "nav" => {
                let Some(input) = parts.get(1).and_then(|s| parse_nav(s)) else {
                    println!("Usage: nav <next|previous|next_group|previous_group|top|bottom|repeat>");
                    continue;
                };
                if !narrator.handle_nav(input, &mut sink) {
                    println!("  (not consumed)");
                }
            }
            "close" => {
                item = None;
                println!("Item closed.");
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }

    drop(item);
}

fn print_usage() {
    println!("Preview: interactive narration shell over a RON scene.");
    println!();
    println!("Usage: preview --scene <path> [--config <path>] [--messages <dir>] [--seed <n>]");
    println!();
    println!("  --scene <path>     Scene graph RON file");
    println!("  --config <path>    Narration config RON file (default: assets/narration.ron)");
    println!("  --messages <dir>   Directory of message catalogs (optional)");
    println!("  --seed <n>         RNG seed for 'scatter' (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  nodes                        List scene nodes");
    println!("  focus <node> [index]         Move the cursor (narrated next tick)");
    println!("  label <node> [index]         Resolve a label immediately");
    println!("  pos <x> <y> [z]              Set the player position");
    println!("  scatter <n> [radius]         Place n random entities");
    println!("  scan [radius]                Announce nearby entities");
    println!("  next / prev                  Cycle the selected entity");
    println!("  filter                       Cycle the category filter");
    println!("  route                        Route to the selected entity");
    println!("  path <x,y> <x,y> ...         Describe a waypoint path");
    println!("  item <name> [a:v,..] [who,..] Open an item detail screen");
    println!("  nav <input>                  Navigate the open screen");
    println!("  close                        Close the item screen");
    println!("  help                         Show this help");
    println!("  quit                         Exit");
}

fn parse_focus(scene: &SceneTree, parts: &[&str]) -> Option<FocusContext> {
    let target = parts.get(1)?;
    let node = match target.trim_start_matches('#').parse::<u32>() {
        Ok(id) if scene.get(NodeId(id)).is_some() => NodeId(id),
        _ => scene.find_by_name(target)?,
    };
    let index = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(0);
    Some(FocusContext::new(node, index))
}

fn parse_point(s: &str) -> Option<Vec3> {
    let coords: Vec<f32> = s.split(',').filter_map(|c| c.trim().parse().ok()).collect();
    match coords.as_slice() {
        [x, y] => Some(Vec3::new(*x, *y, 0.0)),
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

fn parse_stats(s: &str) -> Vec<(u32, i32)> {
    s.split(',')
        .filter_map(|pair| {
            let (code, value) = pair.split_once(':')?;
            Some((code.trim().parse().ok()?, value.trim().parse().ok()?))
        })
        .collect()
}

fn parse_nav(s: &str) -> Option<NavInput> {
    match s.to_lowercase().as_str() {
        "next" | "n" => Some(NavInput::Next),
        "previous" | "prev" | "p" => Some(NavInput::Previous),
        "next_group" => Some(NavInput::NextGroup),
        "previous_group" => Some(NavInput::PreviousGroup),
        "top" => Some(NavInput::Top),
        "bottom" => Some(NavInput::Bottom),
        "repeat" | "r" => Some(NavInput::Repeat),
        _ => None,
    }
}
