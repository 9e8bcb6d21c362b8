use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tangler::sink::{GraphNode, GraphSink, StreamSink};
use tangler::{Code, Compiler, Interpreter, Linker, Log, RuntimeError, Sink};

#[derive(Parser)]
#[command(name = "tangler", about = "Reassemble literate-programming documents into source files")]
struct Cli {
    /// Document(s) to compile and link before running the subcommand.
    #[arg(short = 'i', long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Allow output paths starting with `/` or `~/`.
    #[arg(long)]
    allow_absolute_paths: bool,

    /// Suppress the final newline appended after a tangled file.
    #[arg(long)]
    omit_trailing_newline: bool,

    /// Enable the `|filter` placeholder / `shell` opcode.
    #[arg(long)]
    shell: bool,

    /// Raise the internal debug-trace verbosity; repeat for more (`-vvv`).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write every file in the linked program to disk.
    Tangle,
    /// List the filenames and/or tags the linked program defines.
    Ls {
        #[arg(long)]
        files: bool,
        #[arg(long)]
        tags: bool,
    },
    /// Run one or more tags/files into stdout.
    Call {
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Render the call graph of a tag or file.
    Graph {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        dot: bool,
    },
}

enum CliError {
    Io(io::Error),
    Path(String),
    Parse(tangler::ParseError),
    Link(tangler::LinkError),
    Runtime(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "IoError: {}", e),
            CliError::Path(message) => write!(f, "PathError: {}", message),
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::Link(e) => write!(f, "{}", e),
            CliError::Runtime(message) => write!(f, "{}", message),
        }
    }
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Parse(_) => 1,
            CliError::Link(_) => 2,
            CliError::Runtime(_) => 3,
            CliError::Io(_) | CliError::Path(_) => 4,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<tangler::ParseError> for CliError {
    fn from(e: tangler::ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<tangler::LinkError> for CliError {
    fn from(e: tangler::LinkError) -> Self {
        CliError::Link(e)
    }
}

impl<E: std::fmt::Display> From<RuntimeError<E>> for CliError {
    fn from(e: RuntimeError<E>) -> Self {
        CliError::Runtime(e.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn verbosity_log(count: u8) -> Log<&'static str> {
    Log::from_verbosity("tangler", count)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let log = verbosity_log(cli.verbose);

    let documents: Vec<String> = cli
        .inputs
        .iter()
        .map(fs::read_to_string)
        .collect::<Result<_, _>>()?;
    let codes: Vec<Code> = documents.iter().map(|doc| Code::new(doc.as_bytes())).collect();

    let mut linker = Linker::new().with_log(log);
    for code in &codes {
        let object = Compiler::new(code)
            .allow_shell(cli.shell)
            .with_log(log)
            .compile()?;
        linker.add(object);
    }
    linker.link()?;

    let mut interpreter = Interpreter::new(&linker).with_log(log);

    match &cli.command {
        Command::Tangle => tangle(cli, &mut interpreter, &linker),
        Command::Ls { files, tags } => {
            ls(&linker, *files, *tags);
            Ok(())
        }
        Command::Call { files, tags } => call(&mut interpreter, files, tags),
        Command::Graph { tag, file, dot } => graph(&mut interpreter, tag.as_deref(), file.as_deref(), *dot),
    }
}

fn validate_output_path(path: &str, allow_absolute: bool) -> Result<PathBuf, CliError> {
    if path.contains("../") {
        return Err(CliError::Path(format!("path '{}' contains '../'", path)));
    }
    let is_absolute = path.starts_with('/') || path.starts_with("~/");
    if is_absolute && !allow_absolute {
        return Err(CliError::Path(format!(
            "path '{}' is absolute; pass --allow-absolute-paths to permit this",
            path
        )));
    }
    Ok(PathBuf::from(path))
}

fn tangle(cli: &Cli, interpreter: &mut Interpreter<'_, '_>, linker: &Linker<'_>) -> Result<(), CliError> {
    let names: Vec<String> = linker.file_names().map(str::to_string).collect();
    for name in names {
        let path = validate_output_path(&name, cli.allow_absolute_paths)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::File::create(&path)?;
        let mut sink = StreamSink::new(file);
        interpreter.call_file(&name, &mut sink)?;
        if !cli.omit_trailing_newline {
            sink.write(b"\n", 0)?;
        }
    }
    Ok(())
}

fn ls(linker: &Linker<'_>, files: bool, tags: bool) {
    let show_both = !files && !tags;
    if files || show_both {
        let mut names: Vec<&str> = linker.file_names().collect();
        names.sort_unstable();
        for name in names {
            println!("file: {}", name);
        }
    }
    if tags || show_both {
        let mut names: Vec<&str> = linker.procedure_names().collect();
        names.sort_unstable();
        for name in names {
            println!("tag: {}", name);
        }
    }
}

fn call(interpreter: &mut Interpreter<'_, '_>, files: &[String], tags: &[String]) -> Result<(), CliError> {
    let stdout = io::stdout();
    for path in files {
        let mut sink = StreamSink::new(stdout.lock());
        interpreter.call_file(path, &mut sink)?;
    }
    for tag in tags {
        let mut sink = StreamSink::new(stdout.lock());
        interpreter.call(tag, &mut sink)?;
    }
    Ok(())
}

fn graph(
    interpreter: &mut Interpreter<'_, '_>,
    tag: Option<&str>,
    file: Option<&str>,
    dot: bool,
) -> Result<(), CliError> {
    let mut sink = GraphSink::new();
    match (tag, file) {
        (Some(tag), _) => interpreter.call(tag, &mut sink)?,
        (None, Some(file)) => interpreter.call_file(file, &mut sink)?,
        (None, None) => return Err(CliError::Path("graph requires --tag or --file".into())),
    }

    let roots = sink.into_roots();
    if dot {
        println!("digraph tangler {{");
        for root in &roots {
            print_dot(root);
        }
        println!("}}");
    } else {
        for root in &roots {
            ptree::print_tree(root).map_err(CliError::Io)?;
        }
    }
    Ok(())
}

fn print_dot(node: &GraphNode) {
    for child in &node.children {
        println!("  \"{}\" -> \"{}\";", node.tag, child.tag);
        print_dot(child);
    }
}
