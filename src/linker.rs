use std::collections::HashMap;

use crate::error::LinkError;
use crate::header::Scope;
use crate::instruction::Instruction;
use crate::object::Object;
use crate::util::Log;

/// A resolved entry point: which 1-based module it lives in, and the
/// bytecode offset within that module's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcRef {
    pub module: usize,
    pub entry: usize,
}

/// Merges the [Object]s compiled from every document in a build: resolves
/// tag references across them and threads blocks sharing a tag into one
/// callable procedure (§4.3).
pub struct Linker<'d> {
    objects: Vec<Object<'d>>,
    procedures: HashMap<String, ProcRef>,
    procedure_names: HashMap<(usize, usize), String>,
    files: HashMap<String, ProcRef>,
    generation: u32,
    log: Log<&'static str>,
}

impl<'d> Linker<'d> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            procedures: HashMap::new(),
            procedure_names: HashMap::new(),
            files: HashMap::new(),
            generation: 0,
            log: Log::None,
        }
    }

    pub fn with_log(mut self, log: Log<&'static str>) -> Self {
        self.log = log;
        self
    }

    pub fn add(&mut self, object: Object<'d>) {
        self.objects.push(object);
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, module: usize) -> &Object<'d> {
        &self.objects[module - 1]
    }

    #[cfg(debug_assertions)]
    fn trace(&self, message: &str) {
        if self.log.order() >= Log::Default("").order() {
            eprintln!("[linker:{}] {}", self.log, message);
        }
    }

    #[cfg(not(debug_assertions))]
    fn trace(&self, _message: &str) {}

    /// Resolve the human-readable tag name a `call`/`shell` instruction
    /// targets, given the (already-patched) `(module, address)` pair it
    /// carries. Used by the Interpreter to notify sinks (REDESIGN FLAGS).
    pub fn procedure_name(&self, module: usize, entry: usize) -> Option<&str> {
        self.procedure_names.get(&(module, entry)).map(String::as_str)
    }

    pub fn procedure(&self, name: &str) -> Option<ProcRef> {
        self.procedures.get(name).copied()
    }

    pub fn file(&self, name: &str) -> Option<ProcRef> {
        self.files.get(name).copied()
    }

    pub fn procedure_names(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Run all five phases of linking. Clears and rebuilds `procedures`,
    /// `procedure_names` and `files` every time, so this can be re-run
    /// after mutating the Object set.
    pub fn link(&mut self) -> Result<(), LinkError> {
        self.procedures.clear();
        self.procedure_names.clear();
        self.files.clear();

        self.build_procedure_table()?;
        self.build_file_table()?;
        self.thread_across_modules();
        self.resolve_calls()?;

        self.trace(&format!(
            "linked {} objects: {} procedures, {} files",
            self.objects.len(),
            self.procedures.len(),
            self.files.len()
        ));
        Ok(())
    }

    /// Phase 1: for every Object in order, for every tag it defines,
    /// record the first-seen entry point as canonical and check that
    /// every definition of that tag agrees on scope.
    fn build_procedure_table(&mut self) -> Result<(), LinkError> {
        let mut scopes: HashMap<String, Scope> = HashMap::new();
        for (i, object) in self.objects.iter().enumerate() {
            let module = i + 1;
            for (tag, adjacency) in object.adjacent.iter() {
                match scopes.get(tag) {
                    Some(existing) if *existing != adjacency.scope => {
                        return Err(LinkError::ScopeMismatch(tag.clone()));
                    }
                    Some(_) => {}
                    None => {
                        scopes.insert(tag.clone(), adjacency.scope);
                    }
                }
                self.procedures.entry(tag.clone()).or_insert(ProcRef {
                    module,
                    entry: adjacency.entry,
                });
                self.procedure_names
                    .entry((module, adjacency.entry))
                    .or_insert_with(|| tag.clone());
            }
        }
        Ok(())
    }

    /// Phase 2: every filename across every Object must be globally
    /// unique.
    fn build_file_table(&mut self) -> Result<(), LinkError> {
        for (i, object) in self.objects.iter().enumerate() {
            let module = i + 1;
            for (name, &entry) in object.files.iter() {
                if self.files.contains_key(name) {
                    return Err(LinkError::DuplicateFile(name.clone()));
                }
                self.files.insert(name.clone(), ProcRef { module, entry });
            }
        }
        Ok(())
    }

    /// Phase 3: bump the generation counter, then for every tag, walk the
    /// ordered list of Objects defining it and rewrite each Object's exit
    /// `ret` into a `jmp` targeting the next Object in the chain.
    fn thread_across_modules(&mut self) {
        self.generation += 1;
        let generation = self.generation;

        let mut chains: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, object) in self.objects.iter().enumerate() {
            for tag in object.adjacent.keys() {
                chains.entry(tag.clone()).or_default().push(i);
            }
        }

        for (tag, indices) in chains {
            for pair in indices.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let b_entry = self.objects[b].adjacent[&tag].entry;
                let a_exit = self.objects[a].adjacent[&tag].exit;
                self.objects[a].program[a_exit] = Instruction::Jmp {
                    address: b_entry as u32,
                    module: (b + 1) as u16,
                    generation,
                };
            }
        }
    }

    /// Phase 4 + 5: patch every recorded call site to point at its
    /// procedure's resolved `(module, entry)`, then fail with the full
    /// list of tags that have call sites but no definition.
    fn resolve_calls(&mut self) -> Result<(), LinkError> {
        let procedures = self.procedures.clone();
        let mut undefined = Vec::new();

        for object in self.objects.iter_mut() {
            for (tag, sites) in object.symbols.iter() {
                match procedures.get(tag) {
                    Some(target) => {
                        for &offset in sites {
                            match &mut object.program[offset] {
                                Instruction::Call { address, module, .. } => {
                                    *address = target.entry as u32;
                                    *module = target.module as u16;
                                }
                                Instruction::Shell { address, module, .. } => {
                                    *address = target.entry as u32;
                                    *module = target.module as u16;
                                }
                                _ => {}
                            }
                        }
                    }
                    None => undefined.push(tag.clone()),
                }
            }
        }

        if undefined.is_empty() {
            Ok(())
        } else {
            undefined.sort();
            undefined.dedup();
            Err(LinkError::UndefinedTags(undefined))
        }
    }
}

impl<'d> Default for Linker<'d> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::compiler::Compiler;
    use crate::util::Code;

    fn compile(src: &'static str) -> Object<'static> {
        let code: &'static Code<'static> = Box::leak(Box::new(Code::new(src.as_bytes())));
        Compiler::new(code).compile().expect("compiles")
    }

    #[test]
    fn s3_chained_cross_document_tags_thread_together() {
        let doc1 = compile("```{.zig #foo}\nA\n```\n");
        let doc2 = compile("```{.zig #foo}\nB\n```\n");
        let mut linker = Linker::new();
        linker.add(doc1);
        linker.add(doc2);
        linker.link().expect("links");

        let proc_ref = linker.procedure("foo").expect("foo resolved");
        assert_eq!(proc_ref.module, 1);
        let exit = linker.object(1).adjacent["foo"].exit;
        assert!(matches!(
            linker.object(1).program[exit],
            Instruction::Jmp { module: 2, .. }
        ));
    }

    #[test]
    fn undefined_tag_reference_fails_linking() {
        let doc = compile("```{.zig #a}\n<<missing>>\n```\n");
        let mut linker = Linker::new();
        linker.add(doc);
        let err = linker.link().unwrap_err();
        match err {
            LinkError::UndefinedTags(tags) => assert_eq!(tags, vec!["missing".to_string()]),
            other => panic!("expected UndefinedTags, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_filenames_across_documents_are_fatal() {
        let doc1 = compile("```{.zig file=\"out.rs\"}\nA\n```\n");
        let doc2 = compile("```{.zig file=\"out.rs\"}\nB\n```\n");
        let mut linker = Linker::new();
        linker.add(doc1);
        linker.add(doc2);
        let err = linker.link().unwrap_err();
        assert!(matches!(err, LinkError::DuplicateFile(name) if name == "out.rs"));
    }

    #[test]
    fn scope_mismatch_across_documents_is_fatal() {
        let doc1 = compile("```{.zig #foo}\nA\n```\n");
        let doc2 = compile("```{.zig global #foo}\nB\n```\n");
        let mut linker = Linker::new();
        linker.add(doc1);
        linker.add(doc2);
        let err = linker.link().unwrap_err();
        assert!(matches!(err, LinkError::ScopeMismatch(tag) if tag == "foo"));
    }
}
