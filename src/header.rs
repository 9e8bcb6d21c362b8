use std::fmt::{Display, Formatter};

/// Visibility of a tag's chained definitions: whether other documents in
/// the same link may contribute blocks to the chain (`Global`) or only
/// blocks within the defining document may (`Local`, the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Global,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Local
    }
}

/// What a compiled block ultimately produces: a named output file, a
/// callable tag, a doctest harness, or a bare `example` excluded from
/// the bytecode program entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(String),
    Tag(String),
    Doctest(String),
    Example,
}

/// One half of a placeholder delimiter pair, e.g. `<<`/`>>` or `(())`'s
/// `((`/`))`. `open` and `close` are always equal in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Esc {
    pub open: Vec<u8>,
    pub close: Vec<u8>,
}

impl Esc {
    pub fn new(open: impl Into<Vec<u8>>, close: impl Into<Vec<u8>>) -> Self {
        let open = open.into();
        let close = close.into();
        debug_assert_eq!(open.len(), close.len(), "esc delimiter halves must match in length");
        Self { open, close }
    }

    pub fn chevron() -> Self {
        Self::new(*b"<<", *b">>")
    }

    /// Recognise one of the four supported delimiter names, or `"none"`.
    /// Returns `Ok(None)` for `"none"`: callers interpret that as "no
    /// placeholder scanning for this block". Returns `Err(())` for any
    /// other value — an unrecognised `esc="…"` pair is a syntax error, not
    /// a silent fallback to the chevron default.
    pub fn from_name(name: &str) -> Result<Option<Self>, ()> {
        match name {
            "none" => Ok(None),
            "<<>>" => Ok(Some(Self::chevron())),
            "{{}}" => Ok(Some(Self::new(*b"{{", *b"}}"))),
            "((()))" | "(())" => Ok(Some(Self::new(*b"((", *b"))"))),
            "[[]]" => Ok(Some(Self::new(*b"[[", *b"]]"))),
            _ => Err(()),
        }
    }
}

impl Default for Esc {
    fn default() -> Self {
        Self::chevron()
    }
}

/// A parsed fenced-code-block header: `` ```{.lang attrs…} `` up to and
/// including the closing `}` of the metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub lang: String,
    pub esc: Option<Esc>,
    pub target: Target,
    pub scope: Scope,
}

impl Header {
    pub fn new(lang: String, esc: Option<Esc>, target: Target, scope: Scope) -> Self {
        Self {
            lang,
            esc,
            target,
            scope,
        }
    }

    /// Whether this block's body is scanned for placeholders at all. A
    /// missing `esc` falls back to the chevron default unless the block
    /// is an `example`/`doctest`, which never scan (§4.2).
    pub fn scans_placeholders(&self) -> bool {
        match self.target {
            Target::Example | Target::Doctest(_) => false,
            _ => self.esc.is_some(),
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{.{}", self.lang)?;
        match &self.target {
            Target::File(path) => write!(f, " file=\"{}\"", path)?,
            Target::Tag(tag) => {
                if self.scope == Scope::Global {
                    write!(f, " global")?;
                }
                write!(f, " #{}", tag)?;
            }
            Target::Doctest(cmd) => write!(f, " doctest=\"{}\"", cmd)?,
            Target::Example => write!(f, " example")?,
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod __tests__ {
    use super::*;

    #[test]
    fn esc_from_name_recognises_all_four_pairs() {
        assert_eq!(Esc::from_name("<<>>"), Ok(Some(Esc::chevron())));
        assert_eq!(Esc::from_name("{{}}"), Ok(Some(Esc::new(*b"{{", *b"}}"))));
        assert_eq!(Esc::from_name("(())"), Ok(Some(Esc::new(*b"((", *b"))"))));
        assert_eq!(Esc::from_name("[[]]"), Ok(Some(Esc::new(*b"[[", *b"]]"))));
    }

    #[test]
    fn esc_from_name_none_disables_scanning() {
        assert_eq!(Esc::from_name("none"), Ok(None));
    }

    #[test]
    fn esc_from_name_rejects_unrecognised_pairs() {
        assert_eq!(Esc::from_name("<<)"), Err(()));
    }

    #[test]
    fn header_round_trip_preserves_semantic_fields() {
        let header = Header::new(
            "rs".to_string(),
            Some(Esc::chevron()),
            Target::Tag("greeting".to_string()),
            Scope::Global,
        );
        let rendered = header.to_string();
        assert!(rendered.contains("global"));
        assert!(rendered.contains("#greeting"));
        assert!(rendered.contains(".rs"));
    }

    #[test]
    fn example_and_doctest_never_scan_placeholders() {
        let example = Header::new("rs".into(), Some(Esc::chevron()), Target::Example, Scope::Local);
        assert!(!example.scans_placeholders());
        let doctest = Header::new(
            "rs".into(),
            Some(Esc::chevron()),
            Target::Doctest("cargo test".into()),
            Scope::Local,
        );
        assert!(!doctest.scans_placeholders());
    }
}
