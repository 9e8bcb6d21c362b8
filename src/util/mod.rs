mod code;
mod logger;
mod position;

use once_cell::unsync::OnceCell;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at a byte offset into a [Code].
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper for the input document to be tangled, with lazily computed
/// line-break positions used to translate byte offsets into [Position]s
/// for diagnostics.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_breaks: OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A leveled verbosity label used to gate `#[cfg(debug_assertions)]` tracing
/// in the [Compiler](crate::Compiler), [Linker](crate::Linker) and
/// [Interpreter](crate::Interpreter).
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
