use std::collections::HashSet;

use crate::error::RuntimeError;
use crate::instruction::Instruction;
use crate::linker::Linker;
use crate::sink::Sink;
use crate::util::Log;

/// A return address and the indent delta the triggering `call` added, so
/// `ret` can undo it.
#[derive(Debug, Clone, Copy)]
struct Frame {
    module: usize,
    ip: usize,
    indent: u16,
}

/// A small stack machine that executes a [Linker]'s merged program,
/// driving a [Sink] with the side effects it produces.
pub struct Interpreter<'l, 'd> {
    linker: &'l Linker<'d>,
    module: usize,
    ip: usize,
    stack: Vec<Frame>,
    call_sites: HashSet<(usize, usize)>,
    indent: u16,
    should_indent: bool,
    last_is_newline: bool,
    log: Log<&'static str>,
}

impl<'l, 'd> Interpreter<'l, 'd> {
    pub fn new(linker: &'l Linker<'d>) -> Self {
        Self {
            linker,
            module: 0,
            ip: 0,
            stack: Vec::new(),
            call_sites: HashSet::new(),
            indent: 0,
            should_indent: false,
            last_is_newline: true,
            log: Log::None,
        }
    }

    pub fn with_log(mut self, log: Log<&'static str>) -> Self {
        self.log = log;
        self
    }

    #[cfg(debug_assertions)]
    fn trace(&self, message: &str) {
        if self.log.order() >= Log::Default("").order() {
            eprintln!("[interpreter:{}] {}", self.log, message);
        }
    }

    #[cfg(not(debug_assertions))]
    fn trace(&self, _message: &str) {}

    fn reset(&mut self, module: usize, ip: usize) {
        self.module = module;
        self.ip = ip;
        self.stack.clear();
        self.call_sites.clear();
        self.indent = 0;
        self.should_indent = false;
        self.last_is_newline = true;
    }

    /// Run the tag `name`'s procedure to completion against `sink`.
    pub fn call<S: Sink>(&mut self, name: &str, sink: &mut S) -> Result<(), RuntimeError<S::Error>> {
        let target = self
            .linker
            .procedure(name)
            .ok_or_else(|| RuntimeError::UnknownProcedure(name.to_string()))?;
        self.reset(target.module, target.entry);
        self.run(sink)
    }

    /// Run file `path`'s procedure to completion against `sink`.
    pub fn call_file<S: Sink>(&mut self, path: &str, sink: &mut S) -> Result<(), RuntimeError<S::Error>> {
        let target = self
            .linker
            .file(path)
            .ok_or_else(|| RuntimeError::UnknownFile(path.to_string()))?;
        self.reset(target.module, target.entry);
        self.run(sink)
    }

    fn run<S: Sink>(&mut self, sink: &mut S) -> Result<(), RuntimeError<S::Error>> {
        loop {
            if self.step(sink)? {
                return Ok(());
            }
        }
    }

    fn text(&self) -> &'d [u8] {
        self.linker.object(self.module).code.value
    }

    /// Execute one instruction. Returns `Ok(true)` once the top-level call
    /// has halted.
    fn step<S: Sink>(&mut self, sink: &mut S) -> Result<bool, RuntimeError<S::Error>> {
        let instruction = self.linker.object(self.module).program[self.ip].clone();
        self.ip += 1;

        match instruction {
            Instruction::Write { start, len, nl } => {
                if self.should_indent && self.last_is_newline {
                    sink.indent(self.indent).map_err(RuntimeError::Sink)?;
                } else {
                    self.should_indent = true;
                }
                let start = start as usize;
                let len = len as usize;
                let bytes = &self.text()[start..start + len];
                sink.write(bytes, nl).map_err(RuntimeError::Sink)?;
                self.last_is_newline = nl != 0;
                Ok(false)
            }
            Instruction::Call { address, module, indent } => {
                let site = (self.module, self.ip - 1);
                if !self.call_sites.insert(site) {
                    let name = self
                        .linker
                        .procedure_name(self.resolve_module(module), address as usize)
                        .unwrap_or("?")
                        .to_string();
                    return Err(RuntimeError::CyclicReference(name));
                }
                self.stack.push(Frame {
                    module: self.module,
                    ip: self.ip,
                    indent,
                });
                self.indent += indent;
                self.module = self.resolve_module(module);
                self.ip = address as usize;
                let name = self
                    .linker
                    .procedure_name(self.module, self.ip)
                    .unwrap_or("?")
                    .to_string();
                sink.call(&name, indent).map_err(RuntimeError::Sink)?;
                Ok(false)
            }
            Instruction::Shell {
                address,
                module,
                command_start,
                command_len,
                indent,
            } => {
                let command = &self.text()[command_start as usize..command_start as usize + command_len as usize];
                sink.shell(command).map_err(RuntimeError::Sink)?;
                let site = (self.module, self.ip - 1);
                if !self.call_sites.insert(site) {
                    let name = self
                        .linker
                        .procedure_name(self.resolve_module(module), address as usize)
                        .unwrap_or("?")
                        .to_string();
                    return Err(RuntimeError::CyclicReference(name));
                }
                self.stack.push(Frame {
                    module: self.module,
                    ip: self.ip,
                    indent,
                });
                self.indent += indent;
                self.module = self.resolve_module(module);
                self.ip = address as usize;
                let name = self
                    .linker
                    .procedure_name(self.module, self.ip)
                    .unwrap_or("?")
                    .to_string();
                sink.call(&name, indent).map_err(RuntimeError::Sink)?;
                Ok(false)
            }
            Instruction::Jmp { address, module, .. } => {
                sink.jmp(address as usize).map_err(RuntimeError::Sink)?;
                self.module = self.resolve_module(module);
                self.ip = address as usize;
                sink.write(b"\n", 0).map_err(RuntimeError::Sink)?;
                self.last_is_newline = true;
                Ok(false)
            }
            Instruction::Ret { name_start, name_len } => {
                let name = String::from_utf8_lossy(
                    &self.text()[name_start as usize..name_start as usize + name_len as usize],
                )
                .into_owned();
                match self.stack.pop() {
                    None => {
                        sink.terminate(&name).map_err(RuntimeError::Sink)?;
                        Ok(true)
                    }
                    Some(frame) => {
                        self.call_sites.remove(&(frame.module, frame.ip - 1));
                        self.module = frame.module;
                        self.ip = frame.ip;
                        self.indent -= frame.indent;
                        sink.ret(&name).map_err(RuntimeError::Sink)?;
                        Ok(false)
                    }
                }
            }
        }
    }

    fn resolve_module(&self, module: u16) -> usize {
        if module == 0 {
            self.module
        } else {
            module as usize
        }
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::compiler::Compiler;
    use crate::sink::BufferSink;
    use crate::util::Code;

    fn object(src: &'static str) -> crate::object::Object<'static> {
        let code: &'static Code<'static> = Box::leak(Box::new(Code::new(src.as_bytes())));
        Compiler::new(code).compile().expect("compiles")
    }

    #[test]
    fn s1_basic_call_produces_block_body() {
        let mut linker = Linker::new();
        linker.add(object("```{.zig #foo}\nabc\n```\n"));
        linker.link().unwrap();
        let mut interpreter = Interpreter::new(&linker);
        let mut sink = BufferSink::new();
        interpreter.call("foo", &mut sink).unwrap();
        assert_eq!(sink.into_bytes(), b"abc");
    }

    #[test]
    fn s4_placeholder_expands_inline() {
        let mut linker = Linker::new();
        linker.add(object(
            "```{.zig #root}\npre <<x>> post\n```\n```{.zig #x}\nX\n```\n",
        ));
        linker.link().unwrap();
        let mut interpreter = Interpreter::new(&linker);
        let mut sink = BufferSink::new();
        interpreter.call("root", &mut sink).unwrap();
        assert_eq!(sink.into_bytes(), b"pre X post");
    }

    #[test]
    fn s5_indented_expansion_replays_indent_on_every_line() {
        let mut linker = Linker::new();
        linker.add(object(
            "```{.zig #root}\nif y:\n    <<body>>\n```\n```{.zig #body}\na\nb\n```\n",
        ));
        linker.link().unwrap();
        let mut interpreter = Interpreter::new(&linker);
        let mut sink = BufferSink::new();
        interpreter.call("root", &mut sink).unwrap();
        assert_eq!(sink.into_bytes(), b"if y:\n    a\n    b");
    }

    #[test]
    fn s6_cycle_is_detected_as_a_runtime_error() {
        let mut linker = Linker::new();
        linker.add(object("```{.zig #a}\n<<b>>\n```\n```{.zig #b}\n<<a>>\n```\n"));
        linker.link().unwrap();
        let mut interpreter = Interpreter::new(&linker);
        let mut sink = BufferSink::new();
        let err = interpreter.call("a", &mut sink).unwrap_err();
        assert!(matches!(err, RuntimeError::CyclicReference(_)));
    }

    #[test]
    fn unknown_procedure_is_reported() {
        let mut linker = Linker::new();
        linker.add(object("```{.zig #a}\nx\n```\n"));
        linker.link().unwrap();
        let mut interpreter = Interpreter::new(&linker);
        let mut sink = BufferSink::new();
        let err = interpreter.call("missing", &mut sink).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownProcedure(_)));
    }
}
