//! Replace steps over [`TextDoc`]

use super::doc::{is_well_formed, TextDoc, Token};
use crate::error::StepError;
use crate::mapping::{Assoc, Mappable, StepMap};
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// Replace the tokens between `from` and `to` with `slice`
///
/// Insertions have `from == to`; deletions have an empty slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Vec<Token>,
}

impl ReplaceStep {
    pub fn new(from: usize, to: usize, slice: Vec<Token>) -> Self {
        Self { from, to, slice }
    }

    pub fn insert_text(pos: usize, text: &str) -> Self {
        Self::new(pos, pos, text.chars().map(Token::Char).collect())
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::new(from, to, Vec::new())
    }
}

impl Step for ReplaceStep {
    type Doc = TextDoc;

    fn apply(&self, doc: &TextDoc) -> Result<TextDoc, StepError> {
        if self.from > self.to || self.to > doc.size() {
            return Err(StepError::new(format!(
                "range {}..{} out of bounds (size: {})",
                self.from,
                self.to,
                doc.size()
            )));
        }
        let tokens = doc.tokens();
        let removed = self.to - self.from;
        let mut result = Vec::with_capacity(tokens.len() - removed + self.slice.len());
        result.extend_from_slice(&tokens[..self.from]);
        result.extend_from_slice(&self.slice);
        result.extend_from_slice(&tokens[self.to..]);

        if !is_well_formed(&result) {
            return Err(StepError::new(format!(
                "replacing {}..{} leaves a malformed document",
                self.from, self.to
            )));
        }
        TextDoc::from_tokens(result)
    }

    fn invert(&self, doc: &TextDoc) -> Self {
        let removed = doc
            .tokens()
            .get(self.from..self.to)
            .map(<[Token]>::to_vec)
            .unwrap_or_default();
        Self::new(self.from, self.from + self.slice.len(), removed)
    }

    fn map<M: Mappable + ?Sized>(&self, mapping: &M) -> Option<Self> {
        let from = mapping.map_result(self.from, Assoc::After);
        let to = mapping.map_result(self.to, Assoc::Before);
        if from.deleted_across() && to.deleted_across() {
            return None;
        }
        Some(Self::new(from.pos, from.pos.max(to.pos), self.slice.clone()))
    }

    fn get_map(&self) -> StepMap {
        StepMap::new(self.from, self.to - self.from, self.slice.len())
    }
}
