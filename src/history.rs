//! Undo history that survives collaboration
//!
//! Steps received from the authority must never become undoable locally, but
//! undoing a local edit after remote edits landed has to account for them.
//! The history therefore records the maps of *every* transaction, while only
//! local transactions become undo events:
//!
//! - A local transaction pushes one event holding the inverse of each step.
//! - A transaction tagged `add_to_history = false` (a receive) only appends
//!   its maps, mirror links included. The mirrors pair each rebased local
//!   step with its own undo, so positions inside rebased content survive.
//! - Undoing maps every inverse through everything that happened after its
//!   step. Inverses that no longer apply are skipped.
//!
//! Maps older than the first item of the oldest remaining event can never be
//! reached again, so they are dropped as events leave the stacks. Item
//! indices stay absolute; `offset` counts the maps dropped so far.

use crate::editor::Transaction;
use crate::mapping::Mapping;
use crate::step::Step;
use crate::transform::Transform;
use tracing::trace;

/// Default maximum number of undo events kept
pub const DEFAULT_DEPTH: usize = 100;

/// Direction of a history transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Undo,
    Redo,
}

/// Metadata attached to transactions produced by undo/redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMeta {
    pub kind: HistoryKind,
    /// `(history map index of the reverted step, step index in the transaction)`
    pub mirrors: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
struct Item<S> {
    /// Index of the reverted step's map in the history mapping
    map_index: usize,
    inverted: S,
}

#[derive(Debug, Clone)]
struct Event<S> {
    items: Vec<Item<S>>,
}

impl<S: Step> Event<S> {
    fn from_transform(transform: &Transform<S>, base: usize) -> Self {
        let items = transform
            .steps()
            .iter()
            .zip(transform.docs())
            .enumerate()
            .map(|(i, (step, before))| Item {
                map_index: base + i,
                inverted: step.invert(before),
            })
            .collect();
        Self { items }
    }
}

/// Undo/redo stacks over a replica's step history
#[derive(Debug, Clone)]
pub struct History<S: Step> {
    maps: Mapping,
    /// Absolute index of `maps[0]`
    offset: usize,
    done: Vec<Event<S>>,
    undone: Vec<Event<S>>,
    depth: usize,
}

impl<S: Step> History<S> {
    pub fn new(depth: usize) -> Self {
        Self {
            maps: Mapping::new(),
            offset: 0,
            done: Vec::new(),
            undone: Vec::new(),
            depth,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Number of step maps still kept for remapping
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Record a transaction the host applied
    pub fn apply(&mut self, tr: &Transaction<S>) {
        let local_base = self.maps.len();
        let base = self.offset + local_base;
        self.maps.append_mapping(tr.mapping());

        if let Some(meta) = tr.history_meta() {
            for &(item, step) in &meta.mirrors {
                if let Some(local) = item.checked_sub(self.offset) {
                    self.maps.set_mirror(local, local_base + step);
                }
            }
            let popped = match meta.kind {
                HistoryKind::Undo => self.done.pop(),
                HistoryKind::Redo => self.undone.pop(),
            };
            debug_assert!(popped.is_some(), "history transaction without an event");
            if tr.doc_changed() {
                let event = Event::from_transform(tr, base);
                match meta.kind {
                    HistoryKind::Undo => self.undone.push(event),
                    HistoryKind::Redo => self.done.push(event),
                }
            }
        } else if tr.add_to_history() && tr.doc_changed() {
            self.done.push(Event::from_transform(tr, base));
            self.undone.clear();
            if self.done.len() > self.depth {
                self.done.remove(0);
            }
        }
        self.prune();
    }

    /// Drop the maps no remaining item maps through
    fn prune(&mut self) {
        // Events are pushed in map order, so each stack's bottom is its oldest
        let oldest = [self.done.first(), self.undone.first()]
            .into_iter()
            .flatten()
            .filter_map(|event| event.items.first())
            .map(|item| item.map_index)
            .min()
            .unwrap_or(self.offset + self.maps.len());
        if oldest > self.offset {
            self.maps.drop_front(oldest - self.offset);
            self.offset = oldest;
        }
    }

    /// Build the steps reverting the latest event of the given kind
    ///
    /// Returns `None` when there is nothing to undo (or redo).
    pub(crate) fn pop_event(
        &self,
        doc: &S::Doc,
        kind: HistoryKind,
    ) -> Option<(Transform<S>, HistoryMeta)> {
        let event = match kind {
            HistoryKind::Undo => self.done.last()?,
            HistoryKind::Redo => self.undone.last()?,
        };
        let start = event.items.first()?.map_index;

        // Indices into `remap` are relative to the event's first item
        let mut remap = self.maps.slice(start - self.offset..).to_mapping();
        let mut transform = Transform::new(doc.clone());
        let mut mirrors = Vec::with_capacity(event.items.len());
        for item in event.items.iter().rev() {
            let local = item.map_index - start;
            let Some(step) = item.inverted.map(&remap.slice(local + 1..)) else {
                trace!(index = item.map_index, "history item no longer applicable, skipped");
                continue;
            };
            if let Err(err) = transform.maybe_step(step) {
                trace!(index = item.map_index, %err, "history item failed to apply, skipped");
                continue;
            }
            let applied = transform.steps().len() - 1;
            if let Some(map) = transform.mapping().maps().last() {
                remap.append_map(map.clone(), Some(local));
            }
            mirrors.push((item.map_index, applied));
        }
        Some((transform, HistoryMeta { kind, mirrors }))
    }
}

impl<S: Step> Default for History<S> {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}
