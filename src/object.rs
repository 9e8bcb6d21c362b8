use std::collections::HashMap;

use crate::header::Scope;
use crate::instruction::Instruction;
use crate::util::Code;

/// The offsets of the first and last block compiled for one tag within a
/// single document, plus the scope every block in that chain agreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    pub entry: usize,
    pub exit: usize,
    pub scope: Scope,
}

/// A compiled `doctest="CMD"` block. Doctests never participate in
/// linking (§3) — they are carried on the Object purely so a caller can
/// enumerate and run them separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctest {
    pub name: String,
    pub command: String,
    pub entry: usize,
}

/// The compiled unit produced from one document: its bytecode program
/// plus the symbol tables the [Linker](crate::Linker) merges across
/// documents. Borrows the source bytes via `Code<'d>` rather than
/// copying them (Design Notes §9).
pub struct Object<'d> {
    pub code: &'d Code<'d>,
    pub program: Vec<Instruction>,
    /// tag name -> bytecode offsets of `call`/`shell` instructions
    /// referencing it, for link-time patching.
    pub symbols: HashMap<String, Vec<usize>>,
    /// tag name -> entry/exit of this document's chain for that tag.
    pub adjacent: HashMap<String, Adjacency>,
    /// output filename -> entry offset.
    pub files: HashMap<String, usize>,
    pub doctests: Vec<Doctest>,
}

impl<'d> Object<'d> {
    pub fn new(code: &'d Code<'d>) -> Self {
        Self {
            code,
            program: Vec::new(),
            symbols: HashMap::new(),
            adjacent: HashMap::new(),
            files: HashMap::new(),
            doctests: Vec::new(),
        }
    }

    /// Push an instruction and return the offset it was stored at.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let offset = self.program.len();
        self.program.push(instruction);
        offset
    }

    pub fn record_call_site(&mut self, tag: &str, offset: usize) {
        self.symbols
            .entry(tag.to_string())
            .or_default()
            .push(offset);
    }

    /// Record a new block for `tag` starting at `entry`. If `tag` was
    /// already defined earlier in this document, the caller is
    /// responsible for rewriting the previous chain's `ret` into a `jmp`
    /// (same-document threading, §4.2) before calling this again for the
    /// updated `exit`.
    pub fn define_tag(&mut self, tag: &str, entry: usize, exit: usize, scope: Scope) {
        self.adjacent.insert(
            tag.to_string(),
            Adjacency { entry, exit, scope },
        );
    }

    pub fn define_file(&mut self, name: &str, entry: usize) {
        self.files.insert(name.to_string(), entry);
    }
}
