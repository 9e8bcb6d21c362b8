use tangler::sink::BufferSink;
use tangler::{Code, Compiler, Interpreter, Linker, RuntimeError};

fn run_one(src: &str, entry: &str) -> Vec<u8> {
    let code = Code::new(src.as_bytes());
    let object = Compiler::new(&code).compile().expect("compiles");
    let mut linker = Linker::new();
    linker.add(object);
    linker.link().expect("links");
    let mut interpreter = Interpreter::new(&linker);
    let mut sink = BufferSink::new();
    interpreter.call(entry, &mut sink).expect("runs");
    sink.into_bytes()
}

fn run_many(docs: &[&str], entry: &str) -> Vec<u8> {
    let codes: Vec<Code> = docs.iter().map(|d| Code::new(d.as_bytes())).collect();
    let mut linker = Linker::new();
    for code in &codes {
        let object = Compiler::new(code).compile().expect("compiles");
        linker.add(object);
    }
    linker.link().expect("links");
    let mut interpreter = Interpreter::new(&linker);
    let mut sink = BufferSink::new();
    interpreter.call(entry, &mut sink).expect("runs");
    sink.into_bytes()
}

#[test]
fn s1_basic() {
    let out = run_one("```{.zig #foo}\nabc\n```\n", "foo");
    assert_eq!(out, b"abc");
}

#[test]
fn s2_concat_two_blocks_same_tag() {
    let src = "```{.zig #foo}\nA\n```\nsome prose in between\n```{.zig #foo}\nB\n```\n";
    let out = run_one(src, "foo");
    assert_eq!(out, b"A\nB");
}

#[test]
fn s3_chained_cross_document() {
    let out = run_many(
        &["```{.zig #foo}\nA\n```\n", "```{.zig #foo}\nB\n```\n"],
        "foo",
    );
    assert_eq!(out, b"A\nB");
}

#[test]
fn s4_placeholder() {
    let src = "```{.zig #root}\npre <<x>> post\n```\n```{.zig #x}\nX\n```\n";
    let out = run_one(src, "root");
    assert_eq!(out, b"pre X post");
}

#[test]
fn s5_indented_expansion() {
    let src = "```{.zig #root}\nif y:\n    <<body>>\n```\n```{.zig #body}\na\nb\n```\n";
    let out = run_one(src, "root");
    assert_eq!(out, b"if y:\n    a\n    b");
}

#[test]
fn s6_cycle() {
    let src = "```{.zig #a}\n<<b>>\n```\n```{.zig #b}\n<<a>>\n```\n";
    let code = Code::new(src.as_bytes());
    let object = Compiler::new(&code).compile().expect("compiles");
    let mut linker = Linker::new();
    linker.add(object);
    linker.link().expect("links");
    let mut interpreter = Interpreter::new(&linker);
    let mut sink = BufferSink::new();
    let err = interpreter.call("a", &mut sink).unwrap_err();
    assert!(matches!(err, RuntimeError::CyclicReference(_)));
}

#[test]
fn global_scope_allows_cross_document_contribution_to_the_same_chain() {
    let out = run_many(
        &[
            "```{.zig global #foo}\nA\n```\n",
            "```{.zig global #foo}\nB\n```\n",
            "```{.zig global #foo}\nC\n```\n",
        ],
        "foo",
    );
    assert_eq!(out, b"A\nB\nC");
}

#[test]
fn esc_pair_can_be_overridden_per_block() {
    let src = "```{.zig #root esc=\"{{}}\"}\npre {{x}} post\n```\n```{.zig #x}\nX\n```\n";
    let out = run_one(src, "root");
    assert_eq!(out, b"pre X post");
}

#[test]
fn esc_none_disables_placeholder_scanning() {
    let src = "```{.zig #root esc=\"none\"}\nliteral <<not a call>>\n```\n";
    let out = run_one(src, "root");
    assert_eq!(out, b"literal <<not a call>>");
}
