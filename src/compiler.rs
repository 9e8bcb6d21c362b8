use crate::error::ParseError;
use crate::header::{Esc, Header, Scope, Target};
use crate::instruction::Instruction;
use crate::object::Object;
use crate::token::{Token, TokenTag};
use crate::tokenizer::Tokenizer;
use crate::util::{Code, Log};

/// A fenced-code-block header together with the byte span of whatever
/// name identifies it (the `#tag` identifier, or the quoted `file=`/
/// `doctest=` value) — used to populate a block's trailing `ret`.
struct ParsedHeader {
    header: Header,
    fence_len: usize,
    name_span: (u32, u16),
    body_start: usize,
}

/// Recognises fenced code blocks in a token stream and compiles their
/// bodies into a per-document [Object].
pub struct Compiler<'d> {
    code: &'d Code<'d>,
    tokens: Vec<Token>,
    allow_shell: bool,
    log: Log<&'static str>,
}

impl<'d> Compiler<'d> {
    pub fn new(code: &'d Code<'d>) -> Self {
        Self {
            code,
            tokens: Tokenizer::new(code).collect(),
            allow_shell: false,
            log: Log::None,
        }
    }

    pub fn allow_shell(mut self, allow: bool) -> Self {
        self.allow_shell = allow;
        self
    }

    pub fn with_log(mut self, log: Log<&'static str>) -> Self {
        self.log = log;
        self
    }

    #[cfg(debug_assertions)]
    fn trace(&self, message: &str) {
        if self.log.order() >= Log::Default("").order() {
            eprintln!("[compiler:{}] {}", self.log, message);
        }
    }

    #[cfg(not(debug_assertions))]
    fn trace(&self, _message: &str) {}

    fn lexeme(&self, token: &Token) -> &'d [u8] {
        token.lexeme(self.code)
    }

    fn position_error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(offset, message.into())
    }

    pub fn compile(&self) -> Result<Object<'d>, ParseError> {
        let mut object = Object::new(self.code);
        let mut pos = 0usize;
        let mut at_line_start = true;

        loop {
            if self.tokens[pos].tag == TokenTag::Eof {
                break;
            }
            if at_line_start {
                if let Some(parsed) = self.try_header(pos)? {
                    pos = self.compile_block(parsed, &mut object)?;
                    at_line_start = true;
                    continue;
                }
            }
            at_line_start = self.tokens[pos].tag == TokenTag::Newline;
            pos += 1;
        }

        self.trace(&format!(
            "compiled {} instructions, {} tags, {} files",
            object.program.len(),
            object.adjacent.len(),
            object.files.len()
        ));
        Ok(object)
    }

    /// Attempt to recognise a block header starting at token index `pos`.
    /// Returns `Ok(None)` if the fence+`{`+`.`+lang-identifier prefix does
    /// not match — the caller backs off and resumes scanning one token
    /// later, per §4.2. Once that prefix matches, any further failure is
    /// fatal (`Err`), not recoverable.
    fn try_header(&self, pos: usize) -> Result<Option<ParsedHeader>, ParseError> {
        let fence = &self.tokens[pos];
        if fence.tag != TokenTag::Fence || fence.len() < 3 {
            return Ok(None);
        }
        let fence_len = fence.len();

        let lbrace = match self.tokens.get(pos + 1) {
            Some(t) if t.tag == TokenTag::LBrace && t.start == fence.end => t,
            _ => return Ok(None),
        };
        let dot = match self.tokens.get(pos + 2) {
            Some(t) if t.tag == TokenTag::Dot && t.start == lbrace.end => t,
            _ => return Ok(None),
        };
        let lang_tok = match self.tokens.get(pos + 3) {
            Some(t) if t.tag == TokenTag::Identifier && t.start == dot.end => t,
            _ => return Ok(None),
        };
        let lang = String::from_utf8_lossy(self.lexeme(lang_tok)).into_owned();

        let mut j = pos + 4;
        let mut target: Option<Target> = None;
        let mut saw_global = false;
        let mut esc: Option<Esc> = Some(Esc::chevron());
        let mut name_span: Option<(u32, u16)> = None;

        loop {
            let tok = self
                .tokens
                .get(j)
                .ok_or_else(|| self.position_error(fence.start, "unterminated block header"))?;
            match tok.tag {
                TokenTag::RBrace => {
                    j += 1;
                    break;
                }
                TokenTag::Space | TokenTag::Newline => {
                    j += 1;
                }
                TokenTag::Hash => {
                    let tag_tok = self.tokens.get(j + 1).ok_or_else(|| {
                        self.position_error(tok.start, "'#' not followed by a tag name")
                    })?;
                    if tag_tok.tag != TokenTag::Identifier {
                        return Err(self.position_error(tag_tok.start, "expected tag name after '#'"));
                    }
                    if target.is_some() {
                        return Err(self.position_error(
                            tok.start,
                            "block declares more than one of file=, #tag, doctest=",
                        ));
                    }
                    let tag = String::from_utf8_lossy(self.lexeme(tag_tok)).into_owned();
                    name_span = Some((tag_tok.start as u32, tag_tok.len() as u16));
                    target = Some(Target::Tag(tag));
                    j += 2;
                }
                TokenTag::Identifier => {
                    let word = String::from_utf8_lossy(self.lexeme(tok)).into_owned();
                    match word.as_str() {
                        "global" => {
                            saw_global = true;
                            j += 1;
                        }
                        "example" => {
                            if target.is_some() {
                                return Err(self.position_error(
                                    tok.start,
                                    "block declares more than one of file=, #tag, doctest=, example",
                                ));
                            }
                            target = Some(Target::Example);
                            j += 1;
                        }
                        key => {
                            let eq = self.tokens.get(j + 1).ok_or_else(|| {
                                self.position_error(tok.end, "expected '=' after attribute key")
                            })?;
                            if eq.tag != TokenTag::Equal {
                                return Err(
                                    self.position_error(eq.start, "expected '=' after attribute key")
                                );
                            }
                            let value_tok = self.tokens.get(j + 2).ok_or_else(|| {
                                self.position_error(eq.end, "expected a quoted string after '='")
                            })?;
                            if value_tok.tag != TokenTag::String {
                                return Err(self.position_error(
                                    value_tok.start,
                                    "expected a quoted string after '='",
                                ));
                            }
                            let raw = self.lexeme(value_tok);
                            let inner = &raw[1..raw.len() - 1];
                            let value = String::from_utf8_lossy(inner).into_owned();
                            let inner_span =
                                (value_tok.start as u32 + 1, (value_tok.len() - 2) as u16);
                            match key {
                                "file" => {
                                    if target.is_some() {
                                        return Err(self.position_error(
                                            tok.start,
                                            "block declares more than one of file=, #tag, doctest=",
                                        ));
                                    }
                                    name_span = Some(inner_span);
                                    target = Some(Target::File(value));
                                }
                                "doctest" => {
                                    if target.is_some() {
                                        return Err(self.position_error(
                                            tok.start,
                                            "block declares more than one of file=, #tag, doctest=",
                                        ));
                                    }
                                    name_span = Some(inner_span);
                                    target = Some(Target::Doctest(value));
                                }
                                "esc" => {
                                    esc = Esc::from_name(&value).map_err(|_| {
                                        self.position_error(
                                            value_tok.start,
                                            format!("unrecognised esc delimiter pair '{}'", value),
                                        )
                                    })?;
                                }
                                _ => {}
                            }
                            j += 3;
                        }
                    }
                }
                _ => {
                    return Err(self.position_error(tok.start, "unexpected token in block header"));
                }
            }
        }

        let target = target
            .ok_or_else(|| self.position_error(fence.start, "block header names no target"))?;
        let scope = if saw_global { Scope::Global } else { Scope::Local };
        let name_span = match &target {
            Target::Example => (0u32, 0u16),
            _ => name_span.expect("target implies a name span was captured"),
        };

        let mut body_start = j;
        if let Some(nl) = self.tokens.get(body_start) {
            if nl.tag == TokenTag::Newline {
                body_start += 1;
            }
        }

        Ok(Some(ParsedHeader {
            header: Header::new(lang, esc, target, scope),
            fence_len,
            name_span,
            body_start,
        }))
    }

    /// Compile one block body and return the token index just past its
    /// closing fence (and trailing newline, if any).
    fn compile_block(
        &self,
        parsed: ParsedHeader,
        object: &mut Object<'d>,
    ) -> Result<usize, ParseError> {
        let ParsedHeader {
            header,
            fence_len,
            name_span,
            body_start,
        } = parsed;

        let mut j = body_start;
        let mut at_line_start = true;
        let body_start_byte = self
            .tokens
            .get(body_start)
            .map(|t| t.start)
            .unwrap_or(self.code.value.len());
        let body_end_byte;

        loop {
            let tok = self
                .tokens
                .get(j)
                .ok_or_else(|| self.position_error(body_start_byte, "unterminated code block"))?;
            if tok.tag == TokenTag::Eof {
                return Err(self.position_error(body_start_byte, "unterminated code block"));
            }
            if at_line_start && tok.tag == TokenTag::Fence && tok.len() == fence_len {
                body_end_byte = tok.start;
                j += 1;
                break;
            }
            at_line_start = tok.tag == TokenTag::Newline;
            j += 1;
        }
        if let Some(nl) = self.tokens.get(j) {
            if nl.tag == TokenTag::Newline {
                j += 1;
            }
        }

        if header.target == Target::Example {
            return Ok(j);
        }

        let entry = object.program.len();

        match &header.esc {
            Some(esc) if header.scans_placeholders() => {
                self.scan_body(body_start_byte, body_end_byte, esc, object)?;
            }
            _ => {
                self.flush_write(body_start_byte, body_end_byte, object);
            }
        }
        self.suppress_trailing_newline(object);

        let ret_offset = object.emit(Instruction::Ret {
            name_start: name_span.0,
            name_len: name_span.1,
        });

        match header.target {
            Target::File(ref path) => {
                object.define_file(path, entry);
            }
            Target::Tag(ref tag) => {
                if let Some(prev) = object.adjacent.get(tag).copied() {
                    if prev.scope != header.scope {
                        return Err(self.position_error(
                            body_start_byte,
                            format!("blocks defining tag '{}' do not agree on scope", tag),
                        ));
                    }
                    object.program[prev.exit] = Instruction::Jmp {
                        address: entry as u32,
                        module: 0,
                        generation: 0,
                    };
                    object.define_tag(tag, prev.entry, ret_offset, header.scope);
                } else {
                    object.define_tag(tag, entry, ret_offset, header.scope);
                }
            }
            Target::Doctest(ref command) => {
                object.doctests.push(crate::object::Doctest {
                    name: format!("{}@{}", header.lang, entry),
                    command: command.clone(),
                    entry,
                });
            }
            Target::Example => unreachable!("handled above"),
        }

        Ok(j)
    }

    /// If the last instruction emitted for this block is a `write` with a
    /// positive `nl`, drop one trailing newline (§4.2: "the trailing
    /// newline of every block body is suppressed").
    fn suppress_trailing_newline(&self, object: &mut Object<'d>) {
        if let Some(Instruction::Write { len, nl, .. }) = object.program.last_mut() {
            if *nl > 0 {
                *nl -= 1;
                if *len == 0 && *nl == 0 {
                    object.program.pop();
                }
            }
        }
    }

    /// Emit one `write` instruction per source line in `code.value[start..end]`.
    /// A run spanning several lines is split at every `\n` so the VM can
    /// re-invoke `sink.indent()` at each line boundary (§4.4): each emitted
    /// instruction's `nl` is 0 or 1, never a folded count of several
    /// newlines. No-op for an empty range.
    fn flush_write(&self, start: usize, end: usize, object: &mut Object<'d>) {
        if start >= end {
            return;
        }
        let bytes = self.code.value;
        let mut line_start = start;
        let mut i = start;
        while i < end {
            if bytes[i] == b'\n' {
                object.emit(Instruction::Write {
                    start: line_start as u32,
                    len: (i - line_start) as u32,
                    nl: 1,
                });
                i += 1;
                line_start = i;
                continue;
            }
            i += 1;
        }
        if line_start < end {
            object.emit(Instruction::Write {
                start: line_start as u32,
                len: (end - line_start) as u32,
                nl: 0,
            });
        }
    }

    /// Scan `code.value[start..end]` for `esc`-delimited placeholders,
    /// emitting interleaved `write` and `call`/`shell` instructions. The
    /// placeholder halves are matched directly against raw document bytes
    /// rather than reassembled tokens (REDESIGN FLAGS).
    fn scan_body(
        &self,
        start: usize,
        end: usize,
        esc: &Esc,
        object: &mut Object<'d>,
    ) -> Result<(), ParseError> {
        let bytes = self.code.value;
        let mut i = start;
        let mut run_start = start;
        let mut line_start = start;

        while i < end {
            if bytes[i] == b'\n' {
                line_start = i + 1;
                i += 1;
                continue;
            }
            if end - i >= esc.open.len() && &bytes[i..i + esc.open.len()] == esc.open.as_slice() {
                self.flush_write(run_start, i, object);
                let indent = (i - line_start) as u16;
                let open_end = i + esc.open.len();

                let close_pos = Self::find_subslice(bytes, open_end, end, &esc.close)
                    .ok_or_else(|| self.position_error(i, "unterminated placeholder"))?;

                let content = &bytes[open_end..close_pos];
                let (name, command_span) = Self::split_placeholder(content, open_end);

                if name.is_empty() {
                    return Err(self.position_error(open_end, "placeholder names no tag"));
                }

                let offset = match command_span {
                    Some((cmd_start, cmd_len)) => {
                        if !self.allow_shell {
                            return Err(self.position_error(
                                cmd_start,
                                "'|filter' placeholders require shell support to be enabled",
                            ));
                        }
                        object.emit(Instruction::Shell {
                            address: 0,
                            module: 0,
                            command_start: cmd_start as u32,
                            command_len: cmd_len as u8,
                            indent,
                        })
                    }
                    None => object.emit(Instruction::Call {
                        address: 0,
                        module: 0,
                        indent,
                    }),
                };
                object.record_call_site(&name, offset);

                i = close_pos + esc.close.len();
                run_start = i;
                continue;
            }
            i += 1;
        }
        self.flush_write(run_start, end, object);
        Ok(())
    }

    fn find_subslice(haystack: &[u8], from: usize, to: usize, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || to < from {
            return None;
        }
        let mut i = from;
        while i + needle.len() <= to {
            if &haystack[i..i + needle.len()] == needle {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Split a placeholder's inner content `OPEN_end..CLOSE_start` into
    /// its `name` and, if present, the `|FILTER` command's byte span
    /// (absolute offsets into the document). A trailing `:TYPE` is parsed
    /// but discarded — the distilled grammar declares it informational.
    fn split_placeholder(content: &[u8], content_offset: usize) -> (String, Option<(usize, usize)>) {
        let pipe_pos = content.iter().position(|&b| b == b'|');
        let (name_part, command_span) = match pipe_pos {
            Some(p) => {
                let (cmd_start_rel, cmd_end_rel) = Self::trim_span(content, p + 1, content.len());
                let span = (content_offset + cmd_start_rel, cmd_end_rel - cmd_start_rel);
                (&content[..p], Some(span))
            }
            None => (content, None),
        };
        let colon_pos = name_part.iter().position(|&b| b == b':');
        let name_bytes = match colon_pos {
            Some(p) => &name_part[..p],
            None => name_part,
        };
        let (ts, te) = Self::trim_bounds(name_bytes);
        let name = String::from_utf8_lossy(&name_bytes[ts..te]).into_owned();
        (name, command_span)
    }

    fn trim_bounds(bytes: &[u8]) -> (usize, usize) {
        let mut start = 0;
        let mut end = bytes.len();
        while start < end && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        (start, end)
    }

    fn trim_span(bytes: &[u8], from: usize, to: usize) -> (usize, usize) {
        let slice = &bytes[from..to];
        let (s, e) = Self::trim_bounds(slice);
        (from + s, from + e)
    }
}
