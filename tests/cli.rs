use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn tangler_bin() -> &'static str {
    env!("CARGO_BIN_EXE_tangler")
}

#[test]
fn tangle_writes_every_linked_file_to_disk() {
    let dir = tempdir().expect("tempdir");
    let doc_path = dir.path().join("doc.md");
    fs::write(
        &doc_path,
        "```{.rs file=\"out/hello.rs\"}\nfn main() {}\n```\n",
    )
    .expect("write doc");

    let status = Command::new(tangler_bin())
        .arg("--input")
        .arg(&doc_path)
        .current_dir(dir.path())
        .arg("tangle")
        .status()
        .expect("run tangler");
    assert!(status.success());

    let generated = fs::read_to_string(dir.path().join("out/hello.rs")).expect("read generated file");
    assert_eq!(generated, "fn main() {}\n");
}

#[test]
fn tangle_rejects_absolute_paths_without_the_flag() {
    let dir = tempdir().expect("tempdir");
    let doc_path = dir.path().join("doc.md");
    fs::write(&doc_path, "```{.rs file=\"/etc/x\"}\nabc\n```\n").expect("write doc");

    let output = Command::new(tangler_bin())
        .arg("--input")
        .arg(&doc_path)
        .current_dir(dir.path())
        .arg("tangle")
        .output()
        .expect("run tangler");
    assert!(!output.status.success());
}

#[test]
fn ls_lists_files_and_tags() {
    let dir = tempdir().expect("tempdir");
    let doc_path = dir.path().join("doc.md");
    fs::write(
        &doc_path,
        "```{.rs file=\"out.rs\"}\n<<body>>\n```\n```{.rs #body}\nfn main() {}\n```\n",
    )
    .expect("write doc");

    let output = Command::new(tangler_bin())
        .arg("--input")
        .arg(&doc_path)
        .arg("ls")
        .output()
        .expect("run tangler");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("file: out.rs"));
    assert!(stdout.contains("tag: body"));
}

#[test]
fn call_prints_a_tags_expansion_to_stdout() {
    let dir = tempdir().expect("tempdir");
    let doc_path = dir.path().join("doc.md");
    fs::write(&doc_path, "```{.rs #greeting}\nhello\n```\n").expect("write doc");

    let output = Command::new(tangler_bin())
        .arg("--input")
        .arg(&doc_path)
        .arg("call")
        .arg("--tag")
        .arg("greeting")
        .output()
        .expect("run tangler");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello");
}
