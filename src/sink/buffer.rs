use super::Sink;

/// Accumulates a procedure's output into an in-memory byte buffer. Used by
/// tests and by callers embedding the tangler as a library without
/// touching the filesystem.
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Vec<u8>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Sink for BufferSink {
    type Error = std::convert::Infallible;

    fn write(&mut self, text: &[u8], nl: u16) -> Result<(), Self::Error> {
        self.buffer.extend_from_slice(text);
        for _ in 0..nl {
            self.buffer.push(b'\n');
        }
        Ok(())
    }

    fn indent(&mut self, indent: u16) -> Result<(), Self::Error> {
        self.buffer.extend(std::iter::repeat(b' ').take(indent as usize));
        Ok(())
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn write_then_indent_then_write_accumulates_in_order() {
        let mut sink = BufferSink::new();
        sink.write(b"a", 1).unwrap();
        sink.indent(2).unwrap();
        sink.write(b"b", 0).unwrap();
        assert_eq!(sink.into_bytes(), b"a\n  b");
    }
}
