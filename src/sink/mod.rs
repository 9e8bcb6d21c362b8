//! The visitor surface the [Interpreter](crate::Interpreter) drives while
//! it executes a linked program. A [Sink] has no required methods — every
//! hook defaults to a no-op — so a caller only implements the handful it
//! cares about (Design Notes §9: no compile-time feature detection on the
//! visitor type).

mod buffer;
mod find;
mod graph;
mod stream;

pub use buffer::BufferSink;
pub use find::{FindSink, Reference};
pub use graph::{GraphNode, GraphSink};
pub use stream::StreamSink;

/// Receives the side effects of running a linked program: text to emit,
/// indentation changes, and calls/returns/jumps between tag procedures.
///
/// `Error` lets a sink surface its own I/O failures; the VM wraps them in
/// [RuntimeError::Sink](crate::RuntimeError::Sink) and aborts immediately,
/// with no partial retry.
pub trait Sink {
    type Error;

    /// Emit `text`, then `nl` newlines.
    fn write(&mut self, _text: &[u8], _nl: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called before the first fragment of a new line when the VM's
    /// running indent is non-zero.
    fn indent(&mut self, _indent: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A procedure named `tag` is about to run, nested `indent` columns
    /// deep from the call site.
    fn call(&mut self, _tag: &str, _indent: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Control has returned from the procedure named `tag`.
    fn ret(&mut self, _tag: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// The top-level call for `tag` has finished; no frames remain.
    fn terminate(&mut self, _tag: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A same-tag chain threaded across blocks at bytecode offset
    /// `address`.
    fn jmp(&mut self, _address: usize) -> Result<(), Self::Error> {
        Ok(())
    }

    /// The upcoming call's expansion will be piped through `command`.
    fn shell(&mut self, _command: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
}
