//! Per-replica collaboration state

use super::rebase::Rebaseable;
use crate::step::Step;
use crate::transform::Transform;

/// Confirmed version plus the local steps not yet confirmed
///
/// # Invariants
///
/// - `version` only grows, by the number of confirmed steps received.
/// - `unconfirmed` holds the local steps applied since `version`, in the
///   order they were applied; replaying them on the document at `version`
///   yields the current local document.
#[derive(Debug, Clone)]
pub struct CollabState<S: Step, O> {
    version: u64,
    unconfirmed: Vec<Rebaseable<S, O>>,
}

impl<S: Step, O> CollabState<S, O> {
    pub fn new(version: u64, unconfirmed: Vec<Rebaseable<S, O>>) -> Self {
        Self {
            version,
            unconfirmed,
        }
    }

    /// Version of the last confirmed step received from the authority
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Local steps not yet confirmed, oldest first
    pub fn unconfirmed(&self) -> &[Rebaseable<S, O>] {
        &self.unconfirmed
    }

    pub fn has_unconfirmed(&self) -> bool {
        !self.unconfirmed.is_empty()
    }

    pub(crate) fn push_unconfirmed(
        &mut self,
        records: impl IntoIterator<Item = Rebaseable<S, O>>,
    ) {
        self.unconfirmed.extend(records);
    }
}

/// One rebaseable record per step of a local transform
pub fn unconfirmed_from<S: Step, O: Clone>(
    transform: &Transform<S>,
    origin: O,
) -> Vec<Rebaseable<S, O>> {
    transform
        .steps()
        .iter()
        .zip(transform.docs())
        .map(|(step, before)| Rebaseable::new(step.clone(), step.invert(before), origin.clone()))
        .collect()
}
