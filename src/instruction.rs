/// A unit of compiled bytecode. Modelled as a plain Rust enum rather than
/// the source format's literal 9-byte packed record (Design Notes §9):
/// the packing is a space optimisation the VM never depends on for
/// correctness.
///
/// `module = 0` in [Instruction::Call] and [Instruction::Jmp] means "same
/// module as the current frame"; linking rewrites it to a concrete
/// 1-based module index once the target Object is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Emit `text[start..start+len]` then `nl` newlines.
    Write { start: u32, len: u32, nl: u16 },
    /// Invoke a procedure; push a return frame; add `indent` to the
    /// interpreter's running indent.
    Call {
        address: u32,
        module: u16,
        indent: u16,
    },
    /// Non-returning transfer used to thread adjacent same-tag blocks
    /// together, within or across modules.
    Jmp {
        address: u32,
        module: u16,
        generation: u32,
    },
    /// Pop the current frame; if the stack is now empty, halt and report
    /// `name` (the tag whose chain just finished) to the sink.
    Ret { name_start: u32, name_len: u16 },
    /// Pipe the named tag's expansion through a shell filter command. Only
    /// ever emitted when shell support is enabled at compile time.
    /// `address`/`module` target the tag the same way [Instruction::Call]
    /// does; `command_start`/`command_len` locate the filter command text.
    Shell {
        address: u32,
        module: u16,
        command_start: u32,
        command_len: u8,
        indent: u16,
    },
}

impl Instruction {
    /// Whether this instruction is a `ret` that can be rewritten in place
    /// into a `jmp` by the Compiler's same-document threading or the
    /// Linker's Phase 3 cross-document threading.
    pub fn is_unthreaded_ret(&self) -> bool {
        matches!(self, Instruction::Ret { .. })
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn ret_is_recognised_as_threadable() {
        let ret = Instruction::Ret {
            name_start: 0,
            name_len: 3,
        };
        assert!(ret.is_unthreaded_ret());
        let call = Instruction::Call {
            address: 0,
            module: 0,
            indent: 0,
        };
        assert!(!call.is_unthreaded_ret());
    }
}
