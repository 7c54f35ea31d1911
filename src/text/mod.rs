//! Plain-text document model
//!
//! A concrete step model for the collaboration core: documents are lists of
//! paragraphs of characters, and every edit is a [`ReplaceStep`]. Positions
//! count paragraph boundaries as well as characters, so `1` is the start of
//! the first paragraph's text.
//!
//! # Example
//!
//! ```rust
//! use synckit_collab::Transform;
//! use synckit_collab::text::{ReplaceStep, TextDoc};
//!
//! let mut tr: Transform<ReplaceStep> = Transform::new(TextDoc::from_paragraphs(["hello"]));
//! tr.insert_text(6, " world").unwrap();
//! tr.split(6).unwrap();
//!
//! assert_eq!(tr.doc().paragraphs(), vec!["hello", " world"]);
//! ```

mod doc;
mod step;

pub use doc::{TextDoc, Token};
pub use step::ReplaceStep;

use crate::error::{Result, StepError};
use crate::transform::Transform;

impl Transform<ReplaceStep> {
    /// Replace `from..to` with raw tokens
    pub fn replace(&mut self, from: usize, to: usize, slice: Vec<Token>) -> Result<&mut Self> {
        if from == to && slice.is_empty() {
            return Ok(self);
        }
        self.step(ReplaceStep::new(from, to, slice))
    }

    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<&mut Self> {
        self.replace(pos, pos, text.chars().map(Token::Char).collect())
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
        self.replace(from, to, Vec::new())
    }

    /// Break the paragraph at `pos` in two
    pub fn split(&mut self, pos: usize) -> Result<&mut Self> {
        self.replace(pos, pos, vec![Token::Close, Token::Open])
    }

    /// Join the paragraphs meeting at `pos`, which sits between them
    pub fn join(&mut self, pos: usize) -> Result<&mut Self> {
        let from = pos
            .checked_sub(1)
            .ok_or_else(|| StepError::new("nothing to join before position 0"))?;
        self.replace(from, pos + 1, Vec::new())
    }
}
