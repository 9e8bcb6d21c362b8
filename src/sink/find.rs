use std::convert::Infallible;

use super::Sink;

/// The output byte range a single procedure call expanded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub tag: String,
    pub output_start: usize,
    pub output_end: usize,
}

/// Records which tag expanded into which output byte range, for
/// cross-reference reporting (`tangler graph`'s source-to-target
/// sibling). Does not retain the written bytes themselves.
#[derive(Debug, Default)]
pub struct FindSink {
    position: usize,
    stack: Vec<(String, usize)>,
    references: Vec<Reference>,
}

impl FindSink {
    pub fn new() -> Self {
        Self {
            position: 0,
            stack: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn into_references(self) -> Vec<Reference> {
        self.references
    }
}

impl Sink for FindSink {
    type Error = Infallible;

    fn write(&mut self, text: &[u8], nl: u16) -> Result<(), Self::Error> {
        self.position += text.len() + nl as usize;
        Ok(())
    }

    fn call(&mut self, tag: &str, _indent: u16) -> Result<(), Self::Error> {
        self.stack.push((tag.to_string(), self.position));
        Ok(())
    }

    fn ret(&mut self, _tag: &str) -> Result<(), Self::Error> {
        if let Some((tag, start)) = self.stack.pop() {
            self.references.push(Reference {
                tag,
                output_start: start,
                output_end: self.position,
            });
        }
        Ok(())
    }

    fn terminate(&mut self, tag: &str) -> Result<(), Self::Error> {
        self.references.push(Reference {
            tag: tag.to_string(),
            output_start: 0,
            output_end: self.position,
        });
        Ok(())
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn call_then_write_then_ret_records_the_output_span() {
        let mut sink = FindSink::new();
        sink.write(b"pre ", 0).unwrap();
        sink.call("x", 0).unwrap();
        sink.write(b"X", 0).unwrap();
        sink.ret("x").unwrap();
        sink.write(b" post", 0).unwrap();
        sink.terminate("root").unwrap();

        let refs = sink.into_references();
        let x_ref = refs.iter().find(|r| r.tag == "x").unwrap();
        assert_eq!(x_ref.output_start, 4);
        assert_eq!(x_ref.output_end, 5);
    }
}
