/// Section navigation: a cursor over the narratable sections of one open
/// detail screen, with group jumps.
///
/// At most one session exists at a time. Every input first polls the
/// screen's liveness; a dead screen closes the session silently and the
/// input is reported as not consumed.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::messages::{keys, Translator};
use crate::schema::scene::AccessError;

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("screen data is no longer available")]
    ContextMissing,
    #[error("screen produced no sections")]
    Empty,
    #[error("no section session is open")]
    NotOpen,
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Ascending group start indices for one screen type, with a display
/// name per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTable {
    pub starts: Vec<usize>,
    pub names: Vec<String>,
}

impl GroupTable {
    /// One group covering every section.
    pub fn single(name: &str) -> Self {
        Self {
            starts: vec![0],
            names: vec![name.to_string()],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.starts.first() != Some(&0) {
            return Err("group starts must begin at 0".to_string());
        }
        if self.starts.windows(2).any(|w| w[0] >= w[1]) {
            return Err("group starts must be strictly ascending".to_string());
        }
        if self.starts.len() != self.names.len() {
            return Err(format!(
                "{} group starts but {} names",
                self.starts.len(),
                self.names.len()
            ));
        }
        Ok(())
    }

    /// Group that contains `index`.
    pub fn group_of(&self, index: usize) -> usize {
        self.starts
            .iter()
            .rposition(|&start| start <= index)
            .unwrap_or(0)
    }

    pub fn name(&self, group: usize) -> &str {
        self.names.get(group).map(String::as_str).unwrap_or_default()
    }

    /// Nearest start after `index` within `len` sections, wrapping to the
    /// first group.
    pub fn next_start(&self, index: usize, len: usize) -> Option<usize> {
        let mut usable = self.starts.iter().copied().filter(|&s| s < len);
        let first = usable.clone().next()?;
        Some(usable.find(|&s| s > index).unwrap_or(first))
    }

    /// Nearest start before `index`, wrapping to the last group that fits
    /// within `len` sections.
    pub fn previous_start(&self, index: usize, len: usize) -> Option<usize> {
        let usable: Vec<usize> = self.starts.iter().copied().filter(|&s| s < len).collect();
        let last = *usable.last()?;
        Some(usable.into_iter().rev().find(|&s| s < index).unwrap_or(last))
    }
}

/// A narratable screen. Builds its sections from host data each time it
/// is asked, so a refresh sees current content.
pub trait SectionSource {
    /// Whether the host screen still exists.
    fn is_alive(&self) -> bool;

    fn build_sections(&self, translator: &dyn Translator) -> Result<Vec<String>, SectionError>;
}

/// Discrete navigation presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavInput {
    Next,
    Previous,
    NextGroup,
    PreviousGroup,
    Top,
    Bottom,
    Repeat,
}

struct Session {
    source: Box<dyn SectionSource>,
    groups: GroupTable,
    sections: Vec<String>,
    index: usize,
}

impl Session {
    fn current(&self, translator: &dyn Translator) -> String {
        match self.sections.get(self.index) {
            Some(text) => text.clone(),
            None => translator.translate(keys::NAV_ERROR_READING, &[]),
        }
    }

    fn current_with_group(&self, translator: &dyn Translator) -> String {
        let group = self.groups.group_of(self.index);
        let value = self.current(translator);
        translator.translate(keys::NAV_GROUP, &[self.groups.name(group), &value])
    }
}

/// The section cursor. Closed until [`open`](Self::open) succeeds.
#[derive(Default)]
pub struct SectionNavigator {
    session: Option<Session>,
}

impl SectionNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn sections(&self) -> &[String] {
        self.session
            .as_ref()
            .map(|s| s.sections.as_slice())
            .unwrap_or_default()
    }

    /// Start a session on `source`, replacing any open one, and return the
    /// first section. An empty or unreadable screen leaves the navigator
    /// closed.
    pub fn open(
        &mut self,
        source: Box<dyn SectionSource>,
        groups: GroupTable,
        translator: &dyn Translator,
    ) -> Result<String, SectionError> {
        self.close();
        let sections = source.build_sections(translator)?;
        if sections.is_empty() {
            return Err(SectionError::Empty);
        }
        let session = Session {
            source,
            groups,
            sections,
            index: 0,
        };
        let first = session.current(translator);
        tracing::debug!(sections = session.sections.len(), "section session opened");
        self.session = Some(session);
        Ok(first)
    }

    /// Rebuild the sections of the open session, clamping the index into
    /// the new bounds. Nothing is spoken. A rebuild that fails leaves the
    /// session as it was; one that comes back empty closes it.
    pub fn refresh(&mut self, translator: &dyn Translator) -> Result<(), SectionError> {
        let session = self.live_session().ok_or(SectionError::NotOpen)?;
        let sections = session.source.build_sections(translator)?;
        if sections.is_empty() {
            self.close();
            return Err(SectionError::Empty);
        }
        if session.index >= sections.len() {
            session.index = sections.len() - 1;
        }
        session.sections = sections;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("section session closed");
        }
    }

    /// Service one press. `None` means the input was not for us: either
    /// no session is open or the screen has gone away.
    pub fn handle(&mut self, input: NavInput, translator: &dyn Translator) -> Option<String> {
        match input {
            NavInput::Next => self.next(translator),
            NavInput::Previous => self.previous(translator),
            NavInput::NextGroup => self.jump_next_group(translator),
            NavInput::PreviousGroup => self.jump_previous_group(translator),
            NavInput::Top => self.jump_top(translator),
            NavInput::Bottom => self.jump_bottom(translator),
            NavInput::Repeat => self.repeat(translator),
        }
    }

    pub fn next(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        if session.index + 1 >= session.sections.len() {
            return Some(translator.translate(keys::NAV_BOTTOM, &[]));
        }
        session.index += 1;
        Some(session.current(translator))
    }

    pub fn previous(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        if session.index == 0 {
            return Some(translator.translate(keys::NAV_TOP, &[]));
        }
        session.index -= 1;
        Some(session.current(translator))
    }

    pub fn jump_next_group(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        match session.groups.next_start(session.index, session.sections.len()) {
            Some(start) => {
                session.index = start;
                Some(session.current_with_group(translator))
            }
            None => Some(translator.translate(keys::NAV_NOT_AVAILABLE, &[])),
        }
    }

    pub fn jump_previous_group(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        match session
            .groups
            .previous_start(session.index, session.sections.len())
        {
            Some(start) => {
                session.index = start;
                Some(session.current_with_group(translator))
            }
            None => Some(translator.translate(keys::NAV_NOT_AVAILABLE, &[])),
        }
    }

    pub fn jump_top(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        session.index = 0;
        Some(session.current(translator))
    }

    pub fn jump_bottom(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        session.index = session.sections.len().saturating_sub(1);
        Some(session.current(translator))
    }

    pub fn repeat(&mut self, translator: &dyn Translator) -> Option<String> {
        let session = self.live_session()?;
        Some(session.current(translator))
    }

    /// The open session, after closing it if its screen has died.
    fn live_session(&mut self) -> Option<&mut Session> {
        let alive = self.session.as_ref()?.source.is_alive();
        if !alive {
            tracing::debug!("screen gone; closing section session");
            self.session = None;
            return None;
        }
        self.session.as_mut()
    }
}
