//! Rebasing local steps over confirmed steps
//!
//! Confirmed steps always take effect as if they happened before every
//! locally pending step. That is what makes two replicas that have seen the
//! same confirmed sequence converge, however many local steps either had.
//!
//! # Algorithm
//!
//! 1. Undo the local steps, last first, using their stored inverses.
//! 2. Apply the confirmed steps in order.
//! 3. Redo each local step, oldest first, mapped through everything that
//!    happened after its original position. Each successfully redone step is
//!    mirrored to its own undo, so later local steps map through the
//!    undo/redo pair without losing positions inside it.
//!
//! A local step whose target was removed by a confirmed step maps to nothing,
//! or fails to apply, and is dropped. Deletion wins.

use crate::error::Result;
use crate::step::Step;
use crate::transform::Transform;
use tracing::trace;

/// A local step together with what is needed to undo and redo it
#[derive(Debug, Clone)]
pub struct Rebaseable<S: Step, O> {
    /// The step as currently applied
    pub step: S,
    /// Exact inverse of `step`, relative to the document before it
    pub inverted: S,
    /// Batch the step originally came from (bookkeeping only)
    pub origin: O,
}

impl<S: Step, O> Rebaseable<S, O> {
    pub fn new(step: S, inverted: S, origin: O) -> Self {
        Self {
            step,
            inverted,
            origin,
        }
    }
}

/// Undo `steps`, apply `over`, then redo `steps` on top
///
/// `transform` must start at the document that has `steps` applied. Returns
/// the local steps that survived, re-expressed against the new document and
/// in their original relative order.
///
/// # Errors
///
/// Fails only if an inverse or one of `over` cannot be applied, which means
/// the inputs did not describe the transform's document.
pub fn rebase_steps<S: Step, O: Clone>(
    steps: &[Rebaseable<S, O>],
    over: &[S],
    transform: &mut Transform<S>,
) -> Result<Vec<Rebaseable<S, O>>> {
    let base = transform.steps().len();
    for rebaseable in steps.iter().rev() {
        transform.step(rebaseable.inverted.clone())?;
    }
    for step in over {
        transform.step(step.clone())?;
    }

    let mut result = Vec::with_capacity(steps.len());
    let mut map_from = base + steps.len();
    for rebaseable in steps {
        let mapped = rebaseable
            .step
            .map(&transform.mapping().slice(map_from..));
        map_from -= 1;
        let Some(mapped) = mapped else {
            trace!(index = map_from, "local step no longer applicable, dropped");
            continue;
        };
        if let Err(err) = transform.maybe_step(mapped.clone()) {
            trace!(index = map_from, %err, "rebased local step failed to apply, dropped");
            continue;
        }
        let redone = transform.steps().len() - 1;
        transform.mapping_mut().set_mirror(map_from, redone);
        let inverted = mapped.invert(&transform.docs()[redone]);
        result.push(Rebaseable::new(mapped, inverted, rebaseable.origin.clone()));
    }
    Ok(result)
}
