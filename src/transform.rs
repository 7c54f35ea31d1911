//! Transform: an ordered application of steps to a document

use crate::error::{Result, StepError};
use crate::mapping::Mapping;
use crate::step::Step;

/// Accumulates steps applied to a document
///
/// Keeps the document before every step (needed to invert them) and the
/// composed [`Mapping`] of all steps.
#[derive(Debug, Clone)]
pub struct Transform<S: Step> {
    doc: S::Doc,
    steps: Vec<S>,
    docs: Vec<S::Doc>,
    mapping: Mapping,
}

impl<S: Step> Transform<S> {
    /// Start a transform at the given document
    pub fn new(doc: S::Doc) -> Self {
        Self {
            doc,
            steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// Current document (after all steps)
    pub fn doc(&self) -> &S::Doc {
        &self.doc
    }

    /// Document the transform started at
    pub fn before(&self) -> &S::Doc {
        self.docs.first().unwrap_or(&self.doc)
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    /// Document before each step, `docs()[i]` being the input of `steps()[i]`
    pub fn docs(&self) -> &[S::Doc] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Apply a step that must succeed
    pub fn step(&mut self, step: S) -> Result<&mut Self> {
        self.maybe_step(step)?;
        Ok(self)
    }

    /// Try to apply a step, leaving the transform untouched on failure
    pub fn maybe_step(&mut self, step: S) -> std::result::Result<(), StepError> {
        let doc = step.apply(&self.doc)?;
        self.mapping.append_map(step.get_map(), None);
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.steps.push(step);
        Ok(())
    }
}
