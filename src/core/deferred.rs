/// One-tick deferred focus reads.
///
/// The host moves its cursor asynchronously relative to the move event, so
/// the focused node is read on the following tick. Requests are keyed by
/// cursor; a newer request for the same cursor supersedes an older one.
/// The focus itself is read from the [`FocusProvider`] when the tick fires,
/// never captured at request time.
use rustc_hash::FxHashMap;

use crate::schema::scene::{AccessError, FocusContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CursorId(pub u32);

/// Identifies one scheduled read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub cursor: CursorId,
    pub generation: u64,
}

/// Host query for what a cursor points at right now.
pub trait FocusProvider {
    fn current_focus(&self, cursor: CursorId) -> Result<Option<FocusContext>, AccessError>;
}

/// A read whose tick has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRead {
    pub ticket: Ticket,
    /// `None` when the cursor has nothing focused or the host failed.
    pub focus: Option<FocusContext>,
}

#[derive(Debug, Default)]
pub struct DeferredReads {
    generation: u64,
    pending: FxHashMap<CursorId, u64>,
}

impl DeferredReads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read of `cursor` for the next tick.
    pub fn schedule(&mut self, cursor: CursorId) -> Ticket {
        self.generation += 1;
        if self.pending.insert(cursor, self.generation).is_some() {
            tracing::trace!(cursor = cursor.0, "superseded pending read");
        }
        Ticket {
            cursor,
            generation: self.generation,
        }
    }

    /// Whether `ticket` is still the one that will fire for its cursor.
    pub fn is_pending(&self, ticket: Ticket) -> bool {
        self.pending.get(&ticket.cursor) == Some(&ticket.generation)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Fire every pending read, oldest request first.
    pub fn tick(&mut self, provider: &dyn FocusProvider) -> Vec<DueRead> {
        let mut due: Vec<Ticket> = self
            .pending
            .drain()
            .map(|(cursor, generation)| Ticket { cursor, generation })
            .collect();
        due.sort_by_key(|t| t.generation);

        due.into_iter()
            .map(|ticket| {
                let focus = match provider.current_focus(ticket.cursor) {
                    Ok(focus) => focus,
                    Err(e) => {
                        tracing::warn!(cursor = ticket.cursor.0, error = %e, "focus read failed");
                        None
                    }
                };
                DueRead { ticket, focus }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::scene::NodeId;
    use std::cell::Cell;

    /// Focus that moves when the test says so.
    struct MovingCursor {
        node: Cell<u32>,
        index: Cell<usize>,
    }

    impl FocusProvider for MovingCursor {
        fn current_focus(&self, cursor: CursorId) -> Result<Option<FocusContext>, AccessError> {
            match cursor.0 {
                0 => Ok(Some(FocusContext::new(NodeId(self.node.get()), self.index.get()))),
                1 => Err(AccessError::Unavailable("menu closed".into())),
                _ => Ok(None),
            }
        }
    }

    fn cursor() -> MovingCursor {
        MovingCursor {
            node: Cell::new(4),
            index: Cell::new(0),
        }
    }

    #[test]
    fn nothing_fires_without_schedule() {
        let mut reads = DeferredReads::new();
        assert!(reads.tick(&cursor()).is_empty());
    }

    #[test]
    fn read_happens_at_tick_time() {
        let host = cursor();
        let mut reads = DeferredReads::new();
        reads.schedule(CursorId(0));
        host.index.set(3);
        let due = reads.tick(&host);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].focus, Some(FocusContext::new(NodeId(4), 3)));
        assert!(reads.tick(&host).is_empty());
    }

    #[test]
    fn latest_request_wins() {
        let host = cursor();
        let mut reads = DeferredReads::new();
        let first = reads.schedule(CursorId(0));
        let second = reads.schedule(CursorId(0));
        assert!(!reads.is_pending(first));
        assert!(reads.is_pending(second));

        let due = reads.tick(&host);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].ticket, second);
    }

    #[test]
    fn cursors_are_independent_and_ordered() {
        let host = cursor();
        let mut reads = DeferredReads::new();
        reads.schedule(CursorId(2));
        reads.schedule(CursorId(0));
        reads.schedule(CursorId(1));
        assert_eq!(reads.pending_len(), 3);

        let due = reads.tick(&host);
        let cursors: Vec<u32> = due.iter().map(|d| d.ticket.cursor.0).collect();
        assert_eq!(cursors, vec![2, 0, 1]);
        assert_eq!(due[1].focus, Some(FocusContext::new(NodeId(4), 0)));
        assert_eq!(due[0].focus, None);
        // Host failure degrades to no focus.
        assert_eq!(due[2].focus, None);
    }
}
