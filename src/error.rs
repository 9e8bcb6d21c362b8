use std::fmt::{Display, Formatter};

/// A lexical or syntactic failure raised by the [Compiler](crate::Compiler),
/// carrying the byte offset of the offending token so a caller can translate
/// it into a `(line, column)` via [Code::obtain_position](crate::Code::obtain_position).
#[derive(Debug, Clone)]
pub struct ParseError {
    pub pointer: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(pointer: usize, message: String) -> Self {
        Self { pointer, message }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyntaxError: {}", self.message)
    }
}

/// A semantic failure raised while [Linker::link](crate::Linker::link)ing a
/// set of compiled [Object](crate::Object)s.
#[derive(Debug, Clone)]
pub enum LinkError {
    DuplicateFile(String),
    ScopeMismatch(String),
    UndefinedTags(Vec<String>),
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::DuplicateFile(name) => {
                write!(f, "LinkError: file '{}' is defined more than once", name)
            }
            LinkError::ScopeMismatch(tag) => write!(
                f,
                "LinkError: blocks defining tag '{}' do not agree on scope",
                tag
            ),
            LinkError::UndefinedTags(tags) => write!(
                f,
                "LinkError: reference to undefined tag(s): {}",
                tags.join(", ")
            ),
        }
    }
}

/// A failure raised by the [Interpreter](crate::Interpreter) while executing
/// a linked program, or propagated verbatim from a [Sink](crate::Sink)'s own
/// error type `E`.
#[derive(Debug, Clone)]
pub enum RuntimeError<E> {
    CyclicReference(String),
    UnknownProcedure(String),
    UnknownFile(String),
    Sink(E),
}

impl<E: Display> Display for RuntimeError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::CyclicReference(tag) => {
                write!(f, "RuntimeError: cyclic reference through tag '{}'", tag)
            }
            RuntimeError::UnknownProcedure(name) => {
                write!(f, "RuntimeError: no procedure tagged '{}'", name)
            }
            RuntimeError::UnknownFile(name) => {
                write!(f, "RuntimeError: no file named '{}'", name)
            }
            RuntimeError::Sink(err) => write!(f, "RuntimeError: {}", err),
        }
    }
}
