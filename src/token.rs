use std::fmt::{Display, Formatter};

use crate::util::Code;

/// The closed set of lexical atom kinds the [Tokenizer](crate::Tokenizer)
/// can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenTag {
    Eof,
    Invalid,
    Space,
    Newline,
    Text,
    Fence,
    LBrace,
    RBrace,
    Dot,
    Identifier,
    Equal,
    String,
    Hash,
    LChevron,
    RChevron,
}

/// A lexical atom: a `tag` drawn from [TokenTag] and the byte range
/// `start..end` it spans in the document. The lexeme itself is never
/// copied — it is always recoverable as `code.value[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub tag: TokenTag,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(tag: TokenTag, start: usize, end: usize) -> Self {
        Self { tag, start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the token's own bytes out of `code`.
    pub fn lexeme<'c>(&self, code: &'c Code) -> &'c [u8] {
        &code.value[self.start..self.end]
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("")
            .field(&self.tag)
            .field(&self.start)
            .field(&self.end)
            .finish()
    }
}
