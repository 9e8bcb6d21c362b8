use std::io::{self, Write};

use super::Sink;

/// Writes a procedure's output to any [std::io::Write], padding indent
/// with spaces. Used by the `tangle` and `call` CLI subcommands.
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for StreamSink<W> {
    type Error = io::Error;

    fn write(&mut self, text: &[u8], nl: u16) -> Result<(), Self::Error> {
        self.writer.write_all(text)?;
        for _ in 0..nl {
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn indent(&mut self, indent: u16) -> Result<(), Self::Error> {
        for _ in 0..indent {
            self.writer.write_all(b" ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn writes_pass_through_to_the_underlying_writer() {
        let mut sink = StreamSink::new(Vec::new());
        sink.write(b"abc", 2).unwrap();
        sink.indent(3).unwrap();
        sink.write(b"d", 0).unwrap();
        assert_eq!(sink.into_inner(), b"abc\n\n   d");
    }
}
