//! Reference host: editor state driven by transactions
//!
//! [`EditorState`] wires the collaboration hooks the way a host editor is
//! expected to: every transaction goes through
//! [`Collab::apply_transaction`], receive transactions are kept out of the
//! undo history, and the document is never assigned directly.
//!
//! # Example
//!
//! ```rust
//! use synckit_collab::{ClientId, Collab, CollabConfig, EditorState, ReceiveOptions};
//! use synckit_collab::text::{ReplaceStep, TextDoc};
//!
//! let collab = Collab::new(CollabConfig::with_client_id(ClientId::new(1)));
//! let mut state = EditorState::new(TextDoc::new(), collab).with_history();
//!
//! let mut tr = state.tr();
//! tr.insert_text(1, "hi").unwrap();
//! state.apply(tr).unwrap();
//!
//! let sendable = state.sendable_steps().unwrap();
//! assert_eq!(sendable.steps.len(), 1);
//!
//! // The authority confirms our step
//! let tr = state
//!     .receive_transaction(&sendable.steps, &[ClientId::new(1)], ReceiveOptions::default())
//!     .unwrap();
//! state.apply(tr).unwrap();
//! assert_eq!(state.version(), 1);
//! assert!(state.sendable_steps().is_none());
//! ```

use crate::collab::{Collab, CollabState, CollabTransaction, Receipt, SendableSteps};
use crate::error::{Result, SyncError};
use crate::history::{History, HistoryKind, HistoryMeta};
use crate::identity::{ClientId, TransactionId};
use crate::mapping::{Assoc, Mappable};
use crate::protocol::InboundBatch;
use crate::step::Step;
use crate::transform::Transform;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Cursor or range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn map<M: Mappable + ?Sized>(&self, mapping: &M, assoc: Assoc) -> Self {
        Self::new(mapping.map(self.anchor, assoc), mapping.map(self.head, assoc))
    }
}

/// Options for building a receive transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiveOptions {
    /// Map the selection with a backward bias, so remote text inserted at
    /// the cursor ends up after it
    pub map_selection_backward: bool,
}

/// A set of steps applied to an [`EditorState`] at once
#[derive(Debug, Clone)]
pub struct Transaction<S: Step> {
    id: TransactionId,
    transform: Transform<S>,
    selection: Option<Selection>,
    add_to_history: bool,
    rebased: usize,
    collab_state: Option<CollabState<S, TransactionId>>,
    replacement: Option<S::Doc>,
    history: Option<HistoryMeta>,
}

impl<S: Step> Transaction<S> {
    fn new(transform: Transform<S>) -> Self {
        Self {
            id: TransactionId::new(),
            transform,
            selection: None,
            add_to_history: true,
            rebased: 0,
            collab_state: None,
            replacement: None,
            history: None,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    /// Explicitly set selection, if any
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    /// Number of local steps rebased by a receive transaction
    pub fn rebased(&self) -> usize {
        self.rebased
    }

    /// Ask to swap the whole document out
    ///
    /// Always rejected while a collaborative session is active; documents
    /// change only through steps.
    pub fn replace_document(&mut self, doc: S::Doc) -> &mut Self {
        self.replacement = Some(doc);
        self
    }

    pub fn history_meta(&self) -> Option<&HistoryMeta> {
        self.history.as_ref()
    }
}

impl<S: Step> Deref for Transaction<S> {
    type Target = Transform<S>;

    fn deref(&self) -> &Transform<S> {
        &self.transform
    }
}

impl<S: Step> DerefMut for Transaction<S> {
    fn deref_mut(&mut self) -> &mut Transform<S> {
        &mut self.transform
    }
}

impl<S: Step> CollabTransaction<S, TransactionId> for Transaction<S> {
    fn transform(&self) -> &Transform<S> {
        &self.transform
    }

    fn origin(&self) -> TransactionId {
        self.id
    }

    fn collab_state(&self) -> Option<&CollabState<S, TransactionId>> {
        self.collab_state.as_ref()
    }

    fn replaces_document(&self) -> bool {
        self.replacement.is_some()
    }
}

/// Document, selection, and plugin state of one replica
#[derive(Debug, Clone)]
pub struct EditorState<S: Step> {
    doc: S::Doc,
    selection: Selection,
    collab: Collab,
    collab_state: CollabState<S, TransactionId>,
    history: Option<History<S>>,
}

impl<S: Step> EditorState<S> {
    pub fn new(doc: S::Doc, collab: Collab) -> Self {
        Self {
            doc,
            selection: Selection::default(),
            collab_state: collab.init(),
            collab,
            history: None,
        }
    }

    /// Enable undo/redo
    pub fn with_history(mut self) -> Self {
        self.history = Some(History::default());
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn doc(&self) -> &S::Doc {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn collab(&self) -> &Collab {
        &self.collab
    }

    pub fn collab_state(&self) -> &CollabState<S, TransactionId> {
        &self.collab_state
    }

    pub fn history(&self) -> Option<&History<S>> {
        self.history.as_ref()
    }

    pub fn client_id(&self) -> ClientId {
        self.collab.client_id()
    }

    /// Confirmed version this replica is at
    pub fn version(&self) -> u64 {
        self.collab_state.version()
    }

    /// Start a transaction at the current document
    pub fn tr(&self) -> Transaction<S> {
        Transaction::new(Transform::new(self.doc.clone()))
    }

    /// Apply a transaction, running every hook
    ///
    /// Nothing changes if a hook rejects the transaction.
    pub fn apply(&mut self, tr: Transaction<S>) -> Result<()> {
        if tr.before() != &self.doc {
            return Err(SyncError::StaleTransaction);
        }
        self.collab.apply_transaction(&tr, &mut self.collab_state)?;
        if let Some(history) = &mut self.history {
            history.apply(&tr);
        }
        self.selection = tr
            .selection
            .unwrap_or_else(|| self.selection.map(tr.mapping(), Assoc::After));
        self.doc = tr.transform.doc().clone();
        Ok(())
    }

    /// Transaction folding the next confirmed steps into this state
    pub fn receive_transaction(
        &self,
        steps: &[S],
        client_ids: &[ClientId],
        options: ReceiveOptions,
    ) -> Result<Transaction<S>> {
        let receipt = self
            .collab
            .receive(&self.collab_state, &self.doc, steps, client_ids)?;
        Ok(self.receipt_transaction(receipt, options))
    }

    /// Like [`receive_transaction`](Self::receive_transaction), checking the batch version
    pub fn receive_batch(
        &self,
        batch: &InboundBatch<S>,
        options: ReceiveOptions,
    ) -> Result<Transaction<S>> {
        let receipt = self
            .collab
            .receive_batch(&self.collab_state, &self.doc, batch)?;
        Ok(self.receipt_transaction(receipt, options))
    }

    fn receipt_transaction(
        &self,
        receipt: Receipt<S, TransactionId>,
        options: ReceiveOptions,
    ) -> Transaction<S> {
        let mut tr = Transaction::new(receipt.transform);
        if options.map_selection_backward {
            tr.selection = Some(self.selection.map(tr.mapping(), Assoc::Before));
        }
        tr.add_to_history = false;
        tr.rebased = receipt.rebased;
        tr.collab_state = Some(receipt.state);
        tr
    }

    /// Unconfirmed steps to offer the authority
    pub fn sendable_steps(&self) -> Option<SendableSteps<S, TransactionId>> {
        self.collab.sendable_steps(&self.collab_state)
    }

    /// Transaction undoing the latest local event, if any
    pub fn undo(&self) -> Option<Transaction<S>> {
        self.history_transaction(HistoryKind::Undo)
    }

    /// Transaction redoing the latest undone event, if any
    pub fn redo(&self) -> Option<Transaction<S>> {
        self.history_transaction(HistoryKind::Redo)
    }

    fn history_transaction(&self, kind: HistoryKind) -> Option<Transaction<S>> {
        let (transform, meta) = self.history.as_ref()?.pop_event(&self.doc, kind)?;
        let mut tr = Transaction::new(transform);
        tr.history = Some(meta);
        Some(tr)
    }
}
