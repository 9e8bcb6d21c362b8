//! `tangler` is a literate-programming tangler: it reads pandoc-flavoured
//! Markdown documents in which fenced code blocks carry a tag or an output
//! filename, and reassembles the annotated fragments into complete source
//! files or named procedures.
//!
//! # Design
//!
//! The crate follows the document through four stages. A [Tokenizer] turns
//! raw bytes into a lazy stream of [Token]s. A [Compiler] recognises fenced
//! code blocks and their placeholders in that stream and emits a compact
//! [Instruction] program per document, held together with its symbol tables
//! in an [Object]. A [Linker] merges the `Object`s from every document in
//! the build, threading blocks that share a tag into one callable procedure.
//! Finally an [Interpreter] walks the linked program and drives a [Sink] —
//! a small visitor trait — which is what actually writes files, builds a
//! call-graph, or buffers output in memory.
//!
//! # Example
//!
//! ```
//! use tangler::{Code, Compiler, Linker, Interpreter, sink::BufferSink};
//!
//! let doc = "```{.rs #greeting}\nhello\n```\n";
//! let code = Code::new(doc.as_bytes());
//! let object = Compiler::new(&code).compile().unwrap();
//!
//! let mut linker = Linker::new();
//! linker.add(object);
//! linker.link().unwrap();
//!
//! let mut interpreter = Interpreter::new(&linker);
//! let mut sink = BufferSink::new();
//! interpreter.call("greeting", &mut sink).unwrap();
//! assert_eq!(sink.into_bytes(), b"hello");
//! ```
//!
//! # License
//! [tangler](crate) is provided under the MIT license. See
//! [LICENSE](https://github.com/creative-forest/tangler/blob/main/LICENSE).

mod compiler;
mod error;
mod header;
mod instruction;
mod interpreter;
mod linker;
mod object;
pub mod sink;
mod token;
mod tokenizer;
pub mod util;

pub use compiler::Compiler;
pub use error::{LinkError, ParseError, RuntimeError};
pub use header::{Esc, Header, Scope, Target};
pub use instruction::Instruction;
pub use interpreter::Interpreter;
pub use linker::{Linker, ProcRef};
pub use object::{Adjacency, Doctest, Object};
pub use sink::Sink;
pub use token::{Token, TokenTag};
pub use tokenizer::Tokenizer;
pub use util::{Code, Log, Position};
