//! Paragraph/character documents addressed by token positions

use crate::error::StepError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of document content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Start of a paragraph
    Open,
    /// End of a paragraph
    Close,
    /// A character inside a paragraph
    Char(char),
}

/// A sequence of paragraphs of plain text
///
/// Positions sit between tokens. In a document holding the paragraphs
/// `"hello"` and `"bye"`, position 0 is before the first paragraph, 1 is the
/// start of `"hello"`, 6 its end, 8 the start of `"bye"` and 12 the end of the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Token>", into = "Vec<Token>")]
pub struct TextDoc {
    tokens: Vec<Token>,
}

impl TextDoc {
    /// Document holding a single empty paragraph
    pub fn new() -> Self {
        Self {
            tokens: vec![Token::Open, Token::Close],
        }
    }

    pub fn from_paragraphs<I, P>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut tokens = Vec::new();
        for paragraph in paragraphs {
            tokens.push(Token::Open);
            tokens.extend(paragraph.as_ref().chars().map(Token::Char));
            tokens.push(Token::Close);
        }
        Self { tokens }
    }

    /// Build a document from raw tokens, rejecting malformed sequences
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self, StepError> {
        if !is_well_formed(&tokens) {
            return Err(StepError::new("token sequence is not a list of paragraphs"));
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of positions minus one
    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    pub fn paragraphs(&self) -> Vec<String> {
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        for token in &self.tokens {
            match token {
                Token::Open => current.clear(),
                Token::Char(c) => current.push(*c),
                Token::Close => paragraphs.push(std::mem::take(&mut current)),
            }
        }
        paragraphs
    }

    /// Start and end position of each paragraph's text
    pub fn paragraph_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Open => start = i + 1,
                Token::Close => ranges.push((start, i)),
                Token::Char(_) => {}
            }
        }
        ranges
    }
}

impl Default for TextDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextDoc {
    /// Paragraphs separated by newlines
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.paragraphs().join("\n"))
    }
}

impl TryFrom<Vec<Token>> for TextDoc {
    type Error = StepError;

    fn try_from(tokens: Vec<Token>) -> Result<Self, Self::Error> {
        Self::from_tokens(tokens)
    }
}

impl From<TextDoc> for Vec<Token> {
    fn from(doc: TextDoc) -> Self {
        doc.tokens
    }
}

/// Paragraphs never nest, and characters only appear inside them
pub(crate) fn is_well_formed(tokens: &[Token]) -> bool {
    let mut inside = false;
    for token in tokens {
        match (token, inside) {
            (Token::Open, false) => inside = true,
            (Token::Close, true) => inside = false,
            (Token::Char(_), true) => {}
            _ => return false,
        }
    }
    !inside
}
