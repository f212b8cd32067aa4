/// The narrator: input edge → text → sink.
///
/// Wires together the label resolver, entity scanner, path narrator,
/// section navigator and deferred focus reads behind one façade.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::core::config::{ConfigError, NarrationConfig};
use crate::core::deferred::{CursorId, DeferredReads, FocusProvider, Ticket};
use crate::core::messages::{keys, MessageCatalog, Translator};
use crate::core::navigator::{GroupTable, NavInput, SectionError, SectionNavigator, SectionSource};
use crate::core::path::{PathNarrator, Pathfinder};
use crate::core::resolver::{RemapReader, TextResolver};
use crate::core::scanner::{CategoryFilter, EntityCycler, EntityScanner};
use crate::core::screens::{ItemDetailScreen, ItemRecord, StatusRecord, StatusScreen};
use crate::schema::entity::{EntityHandle, EntityInfo, EntitySource};
use crate::schema::geometry::Vec3;
use crate::schema::path::PathInfo;
use crate::schema::scene::{FocusContext, SceneAccessor};

#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where finished text goes, usually a speech synthesiser.
pub trait NarrationSink {
    fn speak(&mut self, text: &str, interrupt: bool);
}

/// One line handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub interrupt: bool,
}

/// A sink that keeps everything it is told.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub lines: Vec<Utterance>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|u| u.text.as_str()).collect()
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(|u| u.text.as_str())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl NarrationSink for Transcript {
    fn speak(&mut self, text: &str, interrupt: bool) {
        self.lines.push(Utterance {
            text: text.to_string(),
            interrupt,
        });
    }
}

/// Direction for entity cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Next,
    Previous,
}

/// The top-level narrator. Built via `Narrator::builder()`.
pub struct Narrator {
    config: NarrationConfig,
    messages: MessageCatalog,
    resolver: TextResolver,
    scanner: EntityScanner,
    paths: PathNarrator,
    navigator: SectionNavigator,
    deferred: DeferredReads,
    cycler: EntityCycler,
    attributes: Rc<BTreeMap<u32, String>>,
}

/// Builder for constructing a `Narrator`.
#[derive(Default)]
pub struct NarratorBuilder {
    config_path: Option<PathBuf>,
    messages_dir: Option<PathBuf>,
    /// Directly provided config (for testing without files).
    config: Option<NarrationConfig>,
    /// Directly provided messages, merged over the English defaults.
    messages: Option<MessageCatalog>,
    remap_reader: Option<Box<dyn RemapReader>>,
}

impl Narrator {
    pub fn builder() -> NarratorBuilder {
        NarratorBuilder::default()
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.config
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn navigator(&self) -> &SectionNavigator {
        &self.navigator
    }

    pub fn cycler(&self) -> &EntityCycler {
        &self.cycler
    }

    pub fn scanner(&self) -> &EntityScanner {
        &self.scanner
    }

    // --- focus ---

    /// Label for `focus`, read now.
    pub fn resolve_label(&self, scene: &dyn SceneAccessor, focus: &FocusContext) -> Option<String> {
        self.resolver.resolve_label(scene, &self.messages, focus)
    }

    /// The cursor moved; its new focus is read on the next [`tick`](Self::tick).
    pub fn cursor_moved(&mut self, cursor: CursorId) -> Ticket {
        self.deferred.schedule(cursor)
    }

    /// Fire pending focus reads and speak whatever resolves. Returns how
    /// many lines were spoken.
    pub fn tick(
        &mut self,
        scene: &dyn SceneAccessor,
        focus: &dyn FocusProvider,
        sink: &mut dyn NarrationSink,
    ) -> usize {
        let mut spoken = 0;
        for due in self.deferred.tick(focus) {
            let Some(focus) = due.focus else { continue };
            if let Some(label) = self.resolve_label(scene, &focus) {
                sink.speak(&label, true);
                spoken += 1;
            }
        }
        spoken
    }

    // --- entities ---

    /// Scan around `reference`, remember the result for cycling and speak
    /// the bounded report.
    pub fn announce_nearby(
        &mut self,
        source: &dyn EntitySource,
        reference: Vec3,
        handles: &[EntityHandle],
        radius: f32,
        sink: &mut dyn NarrationSink,
    ) -> Vec<EntityInfo> {
        let entries = self.scanner.scan(source, reference, handles, radius);
        let report = self.scanner.format_report(&self.messages, &entries, radius);
        sink.speak(&report, true);
        self.cycler.refresh(entries.clone());
        entries
    }

    /// Step the entity selection and announce it from `reference`.
    pub fn cycle_entity(
        &mut self,
        cycle: Cycle,
        source: &dyn EntitySource,
        reference: Vec3,
        sink: &mut dyn NarrationSink,
    ) {
        match cycle {
            Cycle::Next => self.cycler.next(),
            Cycle::Previous => self.cycler.previous(),
        };
        self.announce_selected(source, reference, sink);
    }

    pub fn cycle_filter(&mut self, sink: &mut dyn NarrationSink) -> CategoryFilter {
        let filter = self.cycler.cycle_filter();
        sink.speak(&self.messages.translate(filter.message_key(), &[]), true);
        filter
    }

    pub fn announce_selected(
        &self,
        source: &dyn EntitySource,
        reference: Vec3,
        sink: &mut dyn NarrationSink,
    ) {
        let text = self
            .cycler
            .announce(&self.scanner, source, &self.messages, reference);
        sink.speak(&text, true);
    }

    // --- paths ---

    pub fn describe_path(&self, waypoints: &[Vec3], sink: &mut dyn NarrationSink) -> String {
        let text = self.paths.describe(&self.messages, waypoints);
        sink.speak(&text, true);
        text
    }

    /// Ask the host for a route to `to` and speak it.
    pub fn plan_route(
        &self,
        pathfinder: &dyn Pathfinder,
        from: Vec3,
        to: Vec3,
        sink: &mut dyn NarrationSink,
    ) -> PathInfo {
        let info = self.paths.plan_route(pathfinder, from, to);
        sink.speak(&self.paths.render(&self.messages, &info), true);
        info
    }

    /// Route to the selected entity's live position.
    pub fn route_to_selected(
        &self,
        pathfinder: &dyn Pathfinder,
        source: &dyn EntitySource,
        from: Vec3,
        sink: &mut dyn NarrationSink,
    ) -> Option<PathInfo> {
        let Some(entry) = self.cycler.current() else {
            sink.speak(&self.messages.translate(keys::ENTITY_NO_SELECTION, &[]), true);
            return None;
        };
        let target = match source.snapshot(entry.handle) {
            Ok(Some(live)) => live.position,
            Ok(None) => {
                sink.speak(&self.messages.translate(keys::ENTITY_GONE, &[]), true);
                return None;
            }
            Err(e) => {
                tracing::warn!(handle = entry.handle.0, error = %e, "entity lookup failed");
                sink.speak(&self.messages.translate(keys::ENTITY_GONE, &[]), true);
                return None;
            }
        };
        Some(self.plan_route(pathfinder, from, target, sink))
    }

    // --- screens ---

    /// Open a section session for `screen_type`, speaking its first
    /// section. Returns whether a session is now open.
    pub fn open_screen(
        &mut self,
        screen_type: &str,
        source: Box<dyn SectionSource>,
        sink: &mut dyn NarrationSink,
    ) -> bool {
        let groups = self
            .config
            .screen(screen_type)
            .cloned()
            .unwrap_or_else(|| GroupTable::single(screen_type));
        match self.navigator.open(source, groups, &self.messages) {
            Ok(first) => {
                sink.speak(&first, true);
                true
            }
            Err(SectionError::Empty) => {
                tracing::debug!(screen = screen_type, "screen has no sections");
                false
            }
            Err(e) => {
                tracing::warn!(screen = screen_type, error = %e, "could not open screen");
                sink.speak(&self.messages.translate(keys::NAV_ERROR_READING, &[]), true);
                false
            }
        }
    }

    pub fn open_item(&mut self, item: &Rc<ItemRecord>, sink: &mut dyn NarrationSink) -> bool {
        let screen = ItemDetailScreen::new(item, Rc::clone(&self.attributes));
        self.open_screen(ItemDetailScreen::SCREEN_TYPE, Box::new(screen), sink)
    }

    pub fn open_status(
        &mut self,
        record: &Rc<RefCell<StatusRecord>>,
        sink: &mut dyn NarrationSink,
    ) -> bool {
        self.open_screen(StatusScreen::SCREEN_TYPE, Box::new(StatusScreen::new(record)), sink)
    }

    /// Screen content changed under the open session. Silent unless the
    /// data could not be read.
    pub fn refresh_screen(&mut self, sink: &mut dyn NarrationSink) {
        match self.navigator.refresh(&self.messages) {
            Ok(()) | Err(SectionError::NotOpen) => {}
            Err(SectionError::Empty) => {
                sink.speak(&self.messages.translate(keys::NAV_NOT_AVAILABLE, &[]), true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "screen refresh failed");
                sink.speak(&self.messages.translate(keys::NAV_ERROR_READING, &[]), true);
            }
        }
    }

    /// Route a navigation press to the open session. Returns `false` when
    /// the input was not consumed and should go to the host.
    pub fn handle_nav(&mut self, input: NavInput, sink: &mut dyn NarrationSink) -> bool {
        match self.navigator.handle(input, &self.messages) {
            Some(text) => {
                sink.speak(&text, true);
                true
            }
            None => false,
        }
    }

    pub fn close_screen(&mut self) {
        self.navigator.close();
    }
}

impl NarratorBuilder {
    /// Load configuration from a RON file. Replaces any config given
    /// through [`with_config`](Self::with_config).
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Merge every `.ron` catalog in `dir` over the built-in messages,
    /// in file name order.
    pub fn messages_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.messages_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Provide configuration directly (for testing without files).
    pub fn with_config(mut self, config: NarrationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide messages directly (for testing without files).
    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_remap_reader(mut self, reader: Box<dyn RemapReader>) -> Self {
        self.remap_reader = Some(reader);
        self
    }

    pub fn build(self) -> Result<Narrator, NarratorError> {
        let config = match self.config_path {
            Some(ref path) => NarrationConfig::load_from_ron(path)?,
            None => {
                let config = self.config.unwrap_or_default();
                config.validate()?;
                config
            }
        };

        let mut messages = MessageCatalog::english();
        if let Some(extra) = self.messages {
            messages.merge(extra);
        }
        if let Some(ref dir) = self.messages_dir {
            if dir.exists() {
                load_ron_files_from_dir(dir, |path| {
                    messages.merge(MessageCatalog::load_from_ron(path)?);
                    Ok(())
                })?;
            } else {
                tracing::warn!(dir = %dir.display(), "messages directory not found");
            }
        }

        let resolver = match self.remap_reader {
            Some(reader) => TextResolver::with_remap_reader(config.resolver.clone(), reader),
            None => TextResolver::new(config.resolver.clone()),
        };
        tracing::debug!(
            strategies = ?resolver.strategy_names(),
            screens = config.screens.len(),
            messages = messages.len(),
            "narrator built"
        );

        Ok(Narrator {
            scanner: EntityScanner::new(config.scanner.clone()),
            paths: PathNarrator::new(config.path),
            attributes: Rc::new(config.attributes.clone()),
            resolver,
            messages,
            navigator: SectionNavigator::new(),
            deferred: DeferredReads::new(),
            cycler: EntityCycler::new(),
            config,
        })
    }
}

/// Load all .ron files from a directory in name order, calling `loader`
/// for each.
fn load_ron_files_from_dir<F>(dir: &Path, mut loader: F) -> Result<(), NarratorError>
where
    F: FnMut(&Path) -> Result<(), NarratorError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            paths.push(path);
        }
    }
    paths.sort();
    for path in paths {
        loader(&path)?;
    }
    Ok(())
}
