//! Replica side of central-authority collaborative editing
//!
//! A central authority orders every confirmed step. Each replica keeps the
//! steps it applied locally but has not seen confirmed yet, offers them to the
//! authority through [`Collab::sendable_steps`], and folds confirmed steps in
//! through [`Collab::receive`]. Local steps are always replayed on top of
//! confirmed ones, so replicas that received the same confirmed prefix end up
//! with identical documents.
//!
//! # Example
//!
//! ```rust
//! use synckit_collab::{ClientId, Collab, CollabConfig, Transform};
//! use synckit_collab::text::{ReplaceStep, TextDoc};
//!
//! let collab = Collab::new(CollabConfig::with_client_id(ClientId::new(1)));
//! let doc = TextDoc::from_paragraphs(["hi"]);
//! let mut state = collab.init::<ReplaceStep, ()>();
//!
//! // Local edit
//! let mut tr = Transform::new(doc);
//! tr.insert_text(3, "!").unwrap();
//! collab.record_local(&tr, (), &mut state);
//! let doc = tr.doc().clone();
//!
//! // Another replica's step gets confirmed first
//! let receipt = collab
//!     .receive(&state, &doc, &[ReplaceStep::insert_text(1, "oh ")], &[ClientId::new(2)])
//!     .unwrap();
//! assert_eq!(receipt.transform.doc().to_string(), "oh hi!");
//! assert_eq!(receipt.state.version(), 1);
//! assert_eq!(receipt.state.unconfirmed().len(), 1);
//! ```

mod rebase;
mod state;

pub use rebase::{rebase_steps, Rebaseable};
pub use state::{unconfirmed_from, CollabState};

use crate::error::{Result, SyncError};
use crate::identity::ClientId;
use crate::protocol::{InboundBatch, OutboundBatch};
use crate::step::Step;
use crate::transform::Transform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Session settings, normally supplied by the authority handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollabConfig {
    /// Version of the document the session starts at
    pub version: u64,

    /// Replica id; drawn at random when absent
    #[serde(rename = "clientID")]
    pub client_id: Option<ClientId>,
}

impl CollabConfig {
    pub fn with_client_id(client_id: ClientId) -> Self {
        Self {
            version: 0,
            client_id: Some(client_id),
        }
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

/// What the collab hook needs from each transaction the host applies
///
/// The host calls [`Collab::apply_transaction`] for every transaction,
/// including the ones produced by [`Collab::receive`].
pub trait CollabTransaction<S: Step, O> {
    /// Steps the transaction applies
    fn transform(&self) -> &Transform<S>;

    /// Origin tag recorded with each local step
    fn origin(&self) -> O;

    /// New collab state carried by a receive transaction
    fn collab_state(&self) -> Option<&CollabState<S, O>>;

    /// Whether the transaction swaps the document out wholesale
    fn replaces_document(&self) -> bool;
}

/// Result of folding a confirmed batch into the local state
#[derive(Debug, Clone)]
pub struct Receipt<S: Step, O> {
    /// Steps to apply to the current document, starting at it
    pub transform: Transform<S>,
    /// Collab state once `transform` is applied
    pub state: CollabState<S, O>,
    /// Number of local steps that were rebased (0 when none were pending)
    pub rebased: usize,
}

/// Local steps waiting to be confirmed, as offered to the authority
#[derive(Debug, Clone)]
pub struct SendableSteps<S, O> {
    pub version: u64,
    pub steps: Vec<S>,
    pub client_id: ClientId,
    /// Origin of each step; steps may have been rebased since
    pub origins: Vec<O>,
}

impl<S: Clone, O> SendableSteps<S, O> {
    /// Wire form of the batch
    pub fn to_batch(&self) -> OutboundBatch<S> {
        OutboundBatch {
            version: self.version,
            steps: self.steps.clone(),
            client_id: self.client_id,
        }
    }
}

/// One replica's collaborative session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collab {
    version: u64,
    client_id: ClientId,
}

impl Collab {
    /// Start a session, drawing a client id from the thread RNG if needed
    pub fn new(config: CollabConfig) -> Self {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Start a session, drawing a client id from `rng` if needed
    pub fn with_rng<R: Rng + ?Sized>(config: CollabConfig, rng: &mut R) -> Self {
        Self {
            version: config.version,
            client_id: config
                .client_id
                .unwrap_or_else(|| ClientId::from_rng(rng)),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Version the session started at
    pub fn initial_version(&self) -> u64 {
        self.version
    }

    /// Fresh state for the start of the session
    pub fn init<S: Step, O>(&self) -> CollabState<S, O> {
        CollabState::new(self.version, Vec::new())
    }

    /// State-transition hook, run for every transaction the host applies
    ///
    /// On error `state` is left untouched.
    pub fn apply_transaction<S, O, T>(&self, tr: &T, state: &mut CollabState<S, O>) -> Result<()>
    where
        S: Step,
        O: Clone,
        T: CollabTransaction<S, O>,
    {
        if tr.replaces_document() {
            warn!(client = %self.client_id, "rejected document replacement during session");
            return Err(SyncError::DocumentReplaced);
        }
        if let Some(received) = tr.collab_state() {
            *state = received.clone();
        } else if tr.transform().doc_changed() {
            self.record_local(tr.transform(), tr.origin(), state);
        }
        Ok(())
    }

    /// Append the steps of a local transform to the unconfirmed list
    pub fn record_local<S: Step, O: Clone>(
        &self,
        transform: &Transform<S>,
        origin: O,
        state: &mut CollabState<S, O>,
    ) {
        state.push_unconfirmed(unconfirmed_from(transform, origin));
    }

    /// Fold the next confirmed steps into the local state
    ///
    /// `steps` must be the confirmed steps directly following
    /// `state.version()`, and `client_ids` the id of the replica each came
    /// from. `doc` is the replica's current document.
    pub fn receive<S: Step, O: Clone>(
        &self,
        state: &CollabState<S, O>,
        doc: &S::Doc,
        steps: &[S],
        client_ids: &[ClientId],
    ) -> Result<Receipt<S, O>> {
        if steps.len() != client_ids.len() {
            warn!(steps = steps.len(), client_ids = client_ids.len(), "rejected malformed batch");
            return Err(SyncError::MalformedBatch {
                steps: steps.len(),
                client_ids: client_ids.len(),
            });
        }
        let version = state.version() + steps.len() as u64;

        // Leading steps that are our own are confirmations of what we sent
        let ours = client_ids
            .iter()
            .take_while(|&&id| id == self.client_id)
            .count();
        let unconfirmed = state.unconfirmed().get(ours..).unwrap_or_default();
        let steps = &steps[ours..];

        let mut transform = Transform::new(doc.clone());
        if steps.is_empty() {
            debug!(version, confirmed = ours, "received own steps only");
            return Ok(Receipt {
                transform,
                state: CollabState::new(version, unconfirmed.to_vec()),
                rebased: 0,
            });
        }

        let rebased = unconfirmed.len();
        let unconfirmed = if unconfirmed.is_empty() {
            for step in steps {
                transform.step(step.clone())?;
            }
            Vec::new()
        } else {
            rebase_steps(unconfirmed, steps, &mut transform)?
        };
        debug!(
            version,
            confirmed = ours,
            foreign = steps.len(),
            rebased,
            dropped = rebased - unconfirmed.len(),
            "received confirmed steps"
        );

        Ok(Receipt {
            transform,
            state: CollabState::new(version, unconfirmed),
            rebased,
        })
    }

    /// Like [`receive`](Self::receive), but checks the batch starts at our version
    pub fn receive_batch<S: Step, O: Clone>(
        &self,
        state: &CollabState<S, O>,
        doc: &S::Doc,
        batch: &InboundBatch<S>,
    ) -> Result<Receipt<S, O>> {
        if batch.version != state.version() {
            warn!(
                expected = state.version(),
                received = batch.version,
                "rejected out-of-order batch"
            );
            return Err(SyncError::VersionMismatch {
                expected: state.version(),
                received: batch.version,
            });
        }
        self.receive(state, doc, &batch.steps, &batch.client_ids)
    }

    /// Steps to send to the authority, or `None` when nothing is pending
    ///
    /// Sending the same batch twice is harmless: the authority accepts a
    /// batch only at the current version, and [`receive`](Self::receive)
    /// strips our own confirmed steps.
    pub fn sendable_steps<S: Step, O: Clone>(
        &self,
        state: &CollabState<S, O>,
    ) -> Option<SendableSteps<S, O>> {
        if !state.has_unconfirmed() {
            return None;
        }
        Some(SendableSteps {
            version: state.version(),
            steps: state.unconfirmed().iter().map(|r| r.step.clone()).collect(),
            client_id: self.client_id,
            origins: state.unconfirmed().iter().map(|r| r.origin.clone()).collect(),
        })
    }
}

#[cfg(all(test, feature = "text"))]
mod tests {
    use super::*;
    use crate::text::{ReplaceStep, TextDoc};

    const ME: ClientId = ClientId(1);
    const OTHER: ClientId = ClientId(2);

    fn session() -> Collab {
        Collab::new(CollabConfig::with_client_id(ME))
    }

    /// Apply a local insertion and record it
    fn type_text(
        collab: &Collab,
        state: &mut CollabState<ReplaceStep, u32>,
        doc: &TextDoc,
        pos: usize,
        text: &str,
    ) -> TextDoc {
        let mut tr = Transform::new(doc.clone());
        tr.insert_text(pos, text).unwrap();
        collab.record_local(&tr, 0, state);
        tr.doc().clone()
    }

    #[test]
    fn test_random_client_id_from_rng() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let a = Collab::with_rng(CollabConfig::default(), &mut StdRng::seed_from_u64(3));
        let b = Collab::with_rng(CollabConfig::default(), &mut StdRng::seed_from_u64(3));
        assert_eq!(a.client_id(), b.client_id());
    }

    #[test]
    fn test_config_from_json() {
        let config: CollabConfig =
            serde_json::from_str(r#"{"version": 12, "clientID": 99}"#).unwrap();
        assert_eq!(config.version, 12);
        assert_eq!(config.client_id, Some(ClientId::new(99)));

        let config: CollabConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CollabConfig::default());
    }

    #[test]
    fn test_initial_version() {
        let collab = Collab::new(CollabConfig::with_client_id(ME).version(5));
        let state = collab.init::<ReplaceStep, u32>();
        assert_eq!(state.version(), 5);
        assert!(collab.sendable_steps(&state).is_none());
    }

    #[test]
    fn test_sendable_steps() {
        let collab = session();
        let mut state = collab.init();
        let doc = TextDoc::new();
        let doc = type_text(&collab, &mut state, &doc, 1, "a");
        type_text(&collab, &mut state, &doc, 2, "b");

        let sendable = collab.sendable_steps(&state).unwrap();
        assert_eq!(sendable.version, 0);
        assert_eq!(sendable.client_id, ME);
        assert_eq!(
            sendable.steps,
            vec![ReplaceStep::insert_text(1, "a"), ReplaceStep::insert_text(2, "b")]
        );
        assert_eq!(sendable.origins, vec![0, 0]);

        // Reading does not mutate
        assert_eq!(state.unconfirmed().len(), 2);
        assert_eq!(sendable.to_batch().steps.len(), 2);
    }

    #[test]
    fn test_receive_own_steps_confirms_without_change() {
        let collab = session();
        let mut state = collab.init();
        let doc = type_text(&collab, &mut state, &TextDoc::new(), 1, "hi");
        let sent = collab.sendable_steps(&state).unwrap();

        let receipt = collab.receive(&state, &doc, &sent.steps, &[ME]).unwrap();
        assert!(!receipt.transform.doc_changed());
        assert_eq!(receipt.state.version(), 1);
        assert!(receipt.state.unconfirmed().is_empty());
        assert_eq!(receipt.rebased, 0);
    }

    #[test]
    fn test_receive_partial_confirmation() {
        let collab = session();
        let mut state = collab.init();
        let doc = type_text(&collab, &mut state, &TextDoc::new(), 1, "a");
        let doc = type_text(&collab, &mut state, &doc, 2, "b");
        let first = state.unconfirmed()[0].step.clone();

        let receipt = collab.receive(&state, &doc, &[first], &[ME]).unwrap();
        assert_eq!(receipt.state.version(), 1);
        assert_eq!(receipt.state.unconfirmed().len(), 1);
        assert_eq!(receipt.transform.doc(), &doc);
    }

    #[test]
    fn test_receive_foreign_fast_path() {
        let collab = session();
        let state = collab.init::<ReplaceStep, u32>();
        let doc = TextDoc::new();

        let receipt = collab
            .receive(&state, &doc, &[ReplaceStep::insert_text(1, "xy")], &[OTHER])
            .unwrap();
        assert_eq!(receipt.transform.doc().to_string(), "xy");
        assert_eq!(receipt.transform.steps().len(), 1);
        assert_eq!(receipt.rebased, 0);
        assert_eq!(receipt.state.version(), 1);
    }

    #[test]
    fn test_receive_rebases_after_own_prefix() {
        let collab = session();
        let mut state = collab.init();
        let doc = type_text(&collab, &mut state, &TextDoc::new(), 1, "a");
        let doc = type_text(&collab, &mut state, &doc, 2, "b");
        let first = state.unconfirmed()[0].step.clone();

        // Our "a" got confirmed, followed by someone else's "X" at the start
        let receipt = collab
            .receive(
                &state,
                &doc,
                &[first, ReplaceStep::insert_text(1, "X")],
                &[ME, OTHER],
            )
            .unwrap();
        assert_eq!(receipt.transform.doc().to_string(), "Xab");
        assert_eq!(receipt.state.version(), 2);
        assert_eq!(receipt.rebased, 1);
        assert_eq!(
            receipt.state.unconfirmed()[0].step,
            ReplaceStep::insert_text(3, "b")
        );
    }

    #[test]
    fn test_own_steps_after_foreign_are_not_stripped() {
        let collab = session();
        let mut state = collab.init();
        let doc = type_text(&collab, &mut state, &TextDoc::new(), 1, "a");

        // Only a leading run of our ids counts as confirmation
        let receipt = collab
            .receive(&state, &doc, &[ReplaceStep::insert_text(1, "X")], &[OTHER])
            .unwrap();
        assert_eq!(receipt.state.unconfirmed().len(), 1);
        assert_eq!(receipt.transform.doc().to_string(), "Xa");
    }

    #[test]
    fn test_receive_malformed_batch() {
        let collab = session();
        let state = collab.init::<ReplaceStep, u32>();
        let result = collab.receive(
            &state,
            &TextDoc::new(),
            &[ReplaceStep::insert_text(1, "x")],
            &[],
        );
        assert!(matches!(
            result,
            Err(SyncError::MalformedBatch {
                steps: 1,
                client_ids: 0
            })
        ));
    }

    #[test]
    fn test_receive_batch_version_mismatch() {
        let collab = session();
        let state = collab.init::<ReplaceStep, u32>();
        let batch = InboundBatch {
            version: 3,
            steps: vec![ReplaceStep::insert_text(1, "x")],
            client_ids: vec![OTHER],
        };
        let result = collab.receive_batch(&state, &TextDoc::new(), &batch);
        assert!(matches!(
            result,
            Err(SyncError::VersionMismatch {
                expected: 0,
                received: 3
            })
        ));
    }

    #[test]
    fn test_inapplicable_foreign_step_is_an_error() {
        let collab = session();
        let state = collab.init::<ReplaceStep, u32>();
        let result = collab.receive(
            &state,
            &TextDoc::new(),
            &[ReplaceStep::delete(5, 9)],
            &[OTHER],
        );
        assert!(matches!(result, Err(SyncError::Step(_))));
    }
}
