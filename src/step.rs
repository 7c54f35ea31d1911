//! The step capability consumed by the collaboration core
//!
//! A step is one atomic, invertible, position-mappable document edit. The
//! document model supplies the concrete step types; the rebase and receive
//! logic is written against this trait only and never looks inside a step.

use crate::error::StepError;
use crate::mapping::{Mappable, StepMap};
use std::fmt::Debug;

/// One atomic document edit
///
/// # Contract
///
/// - `apply` never panics on an inapplicable step; it returns [`StepError`].
/// - `invert(doc)` returns the step that undoes `self` when applied to the
///   document `self` produced from `doc`.
/// - `map` returns `None` when the step no longer makes sense after the
///   mapped changes, e.g. its target content was deleted.
/// - `get_map` describes which ranges the step replaces.
pub trait Step: Clone + Debug {
    /// Document type the step applies to
    type Doc: Clone + Debug + PartialEq;

    /// Apply the step, producing a new document
    fn apply(&self, doc: &Self::Doc) -> Result<Self::Doc, StepError>;

    /// Step that reverts this one, given the document before this step
    fn invert(&self, doc: &Self::Doc) -> Self;

    /// Rewrite the step to apply after the changes described by `mapping`
    fn map<M: Mappable + ?Sized>(&self, mapping: &M) -> Option<Self>;

    /// Position map of this step
    fn get_map(&self) -> StepMap;
}
