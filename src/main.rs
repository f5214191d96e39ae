use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
};

use clap::{Parser, Subcommand};
use pywat::{
    errors::errors::Error,
    format_error,
    lexer::lexer::tokenize,
    lowering::lowering::parse_program,
    parser::parser::parse,
    runner::runner::{compile_unit, entry_result_type, GlobalEnv, Session, Value},
    runtime::{
        host::StdoutImports,
        vm::{Runtime, Vm},
    },
    type_checker::type_checker::type_check,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pywat")]
#[command(version = pywat::VERSION)]
#[command(about = "Compiles a typed Python subset to stack-machine text", long_about = None)]
struct Cli {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file into module text
    Build {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file; defaults to the input with a `.wat` extension
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check a file and print the type its result is read as
    Check {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Compile and run a file with the built-in runtime
    Run {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the tokens of a file
    Tokens {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the syntax tree of a file
    Tree {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Start an interactive session
    Repl,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A source file and the name errors refer to it by.
struct Source {
    name: String,
    content: String,
}

impl Source {
    fn read(path: &Path) -> Result<Source, ExitCode> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Source {
                name: file_name(path),
                content,
            }),
            Err(error) => {
                eprintln!("Failed to read {}: {}", path.display(), error);
                Err(ExitCode::FAILURE)
            }
        }
    }

    fn report(&self, error: &Error) -> ExitCode {
        eprint!("{}", format_error(error, &self.content, &self.name));
        eprintln!("{}", error);
        ExitCode::FAILURE
    }
}

fn build(input: PathBuf, output: Option<PathBuf>) -> Result<(), ExitCode> {
    let source = Source::read(&input)?;
    let compiled = compile_unit(&source.content, Some(source.name.clone()), &GlobalEnv::new())
        .map_err(|error| source.report(&error))?;

    let output = output.unwrap_or_else(|| input.with_extension("wat"));
    fs::write(&output, &compiled.module_text).map_err(|error| {
        eprintln!("Failed to write {}: {}", output.display(), error);
        ExitCode::FAILURE
    })?;

    println!("Wrote {}", output.display());
    Ok(())
}

fn check(input: PathBuf) -> Result<(), ExitCode> {
    let source = Source::read(&input)?;
    let program = parse_program(&source.content, Some(source.name.clone()))
        .map_err(|error| source.report(&error))?;
    let analysis = type_check(&program).map_err(|error| source.report(&error))?;

    println!("{}", entry_result_type(&program, analysis.result_type));
    Ok(())
}

fn run(input: PathBuf) -> Result<(), ExitCode> {
    let source = Source::read(&input)?;
    let compiled = compile_unit(&source.content, Some(source.name.clone()), &GlobalEnv::new())
        .map_err(|error| source.report(&error))?;

    let raw = Vm::new()
        .execute(&compiled.module_text, &mut StdoutImports)
        .map_err(|error| source.report(&error))?;

    let value = Value::convert(raw, compiled.result_type);
    if value != Value::None {
        println!("{}", value);
    }
    Ok(())
}

fn tokens(input: PathBuf) -> Result<(), ExitCode> {
    let source = Source::read(&input)?;
    let tokens = tokenize(source.content.clone(), Some(source.name.clone()))
        .map_err(|error| source.report(&error))?;

    for token in tokens.iter() {
        println!("{:>5}  {:<14} {:?}", token.span.start.0, token.kind.to_string(), token.value);
    }
    Ok(())
}

fn tree(input: PathBuf) -> Result<(), ExitCode> {
    let source = Source::read(&input)?;
    let tokens = tokenize(source.content.clone(), Some(source.name.clone()))
        .map_err(|error| source.report(&error))?;
    let (_, tree) = parse(tokens, Rc::new(source.name.clone()));
    let tree = tree.map_err(|error| source.report(&error))?;

    print!("{}", tree.outline(&source.content));
    Ok(())
}

/// Reads one unit: a single line, or a block started by a line ending in
/// `:` and closed by an empty line.
fn read_unit(stdin: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    print!(">>> ");
    io::stdout().flush()?;
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let mut unit = line.trim_end().to_string();
    if unit.ends_with(':') {
        loop {
            print!("... ");
            io::stdout().flush()?;
            line.clear();
            if stdin.read_line(&mut line)? == 0 || line.trim().is_empty() {
                break;
            }
            unit.push('\n');
            unit.push_str(line.trim_end());
        }
    }

    Ok(Some(unit))
}

fn repl() -> Result<(), ExitCode> {
    println!("pywat {}", pywat::VERSION);
    println!("Type 'exit' to quit.");

    let mut session = Session::new(StdoutImports);
    let mut stdin = io::stdin().lock();

    loop {
        let unit = match read_unit(&mut stdin) {
            Ok(Some(unit)) => unit,
            Ok(None) => break,
            Err(error) => {
                eprintln!("Failed to read input: {}", error);
                return Err(ExitCode::FAILURE);
            }
        };

        let trimmed = unit.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        match session.run(&unit) {
            Ok(Value::None) => {}
            Ok(value) => println!("{}", value),
            Err(error) => {
                Source {
                    name: String::from("shell"),
                    content: unit,
                }
                .report(&error);
            }
        }
        debug!(slots = session.env().layout.offset, "unit done");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build { input, output } => build(input, output),
        Commands::Check { input } => check(input),
        Commands::Run { input } => run(input),
        Commands::Tokens { input } => tokens(input),
        Commands::Tree { input } => tree(input),
        Commands::Repl => repl(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}
