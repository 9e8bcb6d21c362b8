use crate::token::{Token, TokenTag};
use crate::util::Code;

/// A lazy, zero-lookahead lexer over a document's byte slice.
///
/// `Tokenizer` is an [Iterator] of [Token]s: each call to `next` advances
/// the internal cursor by exactly the bytes it consumes and returns one
/// token, so the [Compiler](crate::Compiler) can drive it incrementally
/// instead of materialising the whole document up front.
pub struct Tokenizer<'c> {
    code: &'c Code<'c>,
    pointer: usize,
    emitted_eof: bool,
}

impl<'c> Tokenizer<'c> {
    pub fn new(code: &'c Code<'c>) -> Self {
        Self {
            code,
            pointer: 0,
            emitted_eof: false,
        }
    }

    pub fn code(&self) -> &'c Code<'c> {
        self.code
    }

    /// Whether `byte` can start a fresh token, i.e. whether a run of "any
    /// other character" (the `text` catch-all) must stop before it.
    fn starts_token(byte: u8) -> bool {
        matches!(
            byte,
            b'.' | b'#'
                | b'='
                | b'\n'
                | b'`'
                | b'~'
                | b':'
                | b'<'
                | b'>'
                | b'{'
                | b'}'
                | b'"'
                | b' '
                | b'\t'
                | b'\r'
        ) || byte.is_ascii_alphabetic()
            || byte == b'_'
    }

    fn is_identifier_continue(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
    }

    fn is_space(byte: u8) -> bool {
        matches!(byte, b' ' | b'\t' | b'\r')
    }
}

impl<'c> Iterator for Tokenizer<'c> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let bytes = self.code.value;
        let start = self.pointer;

        if start >= bytes.len() {
            self.emitted_eof = true;
            return Some(Token::new(TokenTag::Eof, start, start));
        }

        let c = bytes[start];
        let (tag, end) = match c {
            b'.' => (TokenTag::Dot, start + 1),
            b'#' => (TokenTag::Hash, start + 1),
            b'=' => (TokenTag::Equal, start + 1),
            b'\n' => (TokenTag::Newline, start + 1),
            b'`' | b'~' | b':' => {
                let mut end = start + 1;
                while end < bytes.len() && bytes[end] == c {
                    end += 1;
                }
                (TokenTag::Fence, end)
            }
            b'<' | b'>' | b'{' | b'}' => {
                if start + 1 < bytes.len() && bytes[start + 1] == c {
                    let tag = if c == b'<' || c == b'{' {
                        TokenTag::LChevron
                    } else {
                        TokenTag::RChevron
                    };
                    (tag, start + 2)
                } else {
                    match c {
                        b'{' => (TokenTag::LBrace, start + 1),
                        b'}' => (TokenTag::RBrace, start + 1),
                        // A lone '<' or '>' has no dedicated tag; fold into text.
                        _ => (TokenTag::Text, start + 1),
                    }
                }
            }
            b'"' => {
                let mut end = start + 1;
                let mut closed = false;
                while end < bytes.len() {
                    if bytes[end] == b'\n' {
                        break;
                    }
                    if bytes[end] == b'"' {
                        end += 1;
                        closed = true;
                        break;
                    }
                    end += 1;
                }
                let tag = if closed {
                    TokenTag::String
                } else {
                    TokenTag::Invalid
                };
                (tag, end)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = start + 1;
                while end < bytes.len() && Self::is_identifier_continue(bytes[end]) {
                    end += 1;
                }
                (TokenTag::Identifier, end)
            }
            c if Self::is_space(c) => {
                let mut end = start + 1;
                while end < bytes.len() && Self::is_space(bytes[end]) {
                    end += 1;
                }
                (TokenTag::Space, end)
            }
            _ => {
                let mut end = start + 1;
                while end < bytes.len() && !Self::starts_token(bytes[end]) {
                    end += 1;
                }
                (TokenTag::Text, end)
            }
        };

        self.pointer = end;
        Some(Token::new(tag, start, end))
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;
    use crate::util::Code;

    fn tags(input: &str) -> Vec<TokenTag> {
        let code = Code::new(input.as_bytes());
        Tokenizer::new(&code).map(|t| t.tag).collect()
    }

    #[test]
    fn totality_covers_input_without_gaps() {
        let input = "abc `123` <<foo>> {.rs #bar}\n\"str\"  ((x))";
        let code = Code::new(input.as_bytes());
        let tokens: Vec<Token> = Tokenizer::new(&code).collect();
        let mut cursor = 0;
        for token in &tokens {
            assert_eq!(token.start, cursor, "token {:?} does not start where the previous one ended", token);
            cursor = token.end;
        }
        assert_eq!(cursor, input.len());
        assert_eq!(tokens.last().unwrap().tag, TokenTag::Eof);
    }

    #[test]
    fn fence_run_length_is_captured_by_span() {
        let code = Code::new(b"````");
        let mut tokenizer = Tokenizer::new(&code);
        let fence = tokenizer.next().unwrap();
        assert_eq!(fence.tag, TokenTag::Fence);
        assert_eq!(fence.len(), 4);
    }

    #[test]
    fn doubled_angle_brackets_are_chevrons() {
        assert_eq!(
            tags("<<"),
            vec![TokenTag::LChevron, TokenTag::Eof]
        );
        assert_eq!(
            tags(">>"),
            vec![TokenTag::RChevron, TokenTag::Eof]
        );
    }

    #[test]
    fn lone_brace_is_brace_not_chevron() {
        assert_eq!(tags("{"), vec![TokenTag::LBrace, TokenTag::Eof]);
        assert_eq!(tags("}"), vec![TokenTag::RBrace, TokenTag::Eof]);
    }

    #[test]
    fn lone_angle_bracket_folds_into_text() {
        assert_eq!(tags("<"), vec![TokenTag::Text, TokenTag::Eof]);
    }

    #[test]
    fn unterminated_string_is_invalid() {
        assert_eq!(tags("\"abc"), vec![TokenTag::Invalid, TokenTag::Eof]);
        assert_eq!(tags("\"abc\ndef\""), vec![TokenTag::Invalid, TokenTag::Newline, TokenTag::Text, TokenTag::Eof]);
    }

    #[test]
    fn identifier_continues_over_digits_and_hyphen() {
        let code = Code::new(b"foo-bar2_baz");
        let mut tokenizer = Tokenizer::new(&code);
        let id = tokenizer.next().unwrap();
        assert_eq!(id.tag, TokenTag::Identifier);
        assert_eq!(id.lexeme(&code), b"foo-bar2_baz");
    }

    #[test]
    fn paren_and_bracket_pairs_land_in_text() {
        assert_eq!(tags("(("), vec![TokenTag::Text, TokenTag::Eof]);
        assert_eq!(tags("[["), vec![TokenTag::Text, TokenTag::Eof]);
    }
}
