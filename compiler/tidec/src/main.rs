//! The `tidec` command-line driver: reads one C-subset translation unit,
//! lexes and parses it, and emits its LLVM IR text. No persisted state —
//! every invocation is an independent, pure translation.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tidec_lexer::Lexer;
use tidec_log::error::ErrorSink;
use tidec_parser::parse_translation_unit;
use tracing::debug;

/// Compiles a subset of C straight to LLVM IR text.
#[derive(ClapParser, Debug)]
#[command(name = "tidec", version, about)]
struct Cli {
    /// Input source file; reads from stdin when omitted.
    input: Option<PathBuf>,

    /// Write the emitted IR to PATH instead of stdout.
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Verbose logging (info level).
    #[arg(short = 'v')]
    verbose: bool,

    /// Dump the parsed AST to stderr before emitting IR.
    #[arg(short = 'a')]
    dump_ast: bool,

    /// Dump the token stream to stderr before parsing.
    #[arg(short = 't')]
    dump_tokens: bool,

    /// Debug logging (trace level), implies -v.
    #[arg(short = 'd')]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tidec_logger(&cli);
    debug!("logging initialized");

    let source = match read_source(cli.input.as_deref()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Fatal Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut errors = ErrorSink::new();

    if cli.dump_tokens {
        let tokens = Lexer::tokenize(&source, &mut ErrorSink::new());
        eprintln!("{:#?}", tokens);
    }

    let tu = parse_translation_unit(&source, &mut errors);

    if cli.dump_ast {
        if let Some(root) = tu.root {
            eprintln!("{:#?}", tu.ast.get(root));
        }
    }

    if errors.error_get_count() > 0 {
        eprintln!(
            "Error: {} error(s) encountered; no IR emitted",
            errors.error_get_count()
        );
        return ExitCode::FAILURE;
    }

    let ir = tidec_codegen_llvm::compile_translation_unit(&tu);

    match write_output(cli.output.as_deref(), &ir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Fatal Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn read_source(input: Option<&std::path::Path>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_output(output: Option<&std::path::Path>, ir: &str) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, ir),
        None => io::stdout().write_all(ir.as_bytes()),
    }
}

fn init_tidec_logger(cli: &Cli) {
    if cli.debug {
        std::env::set_var("TIDEC_LOG_FILTER", "trace");
    } else if cli.verbose && std::env::var("TIDEC_LOG_FILTER").is_err() {
        std::env::set_var("TIDEC_LOG_FILTER", "info");
    }

    let cfg = match tidec_log::LoggerConfig::from_env("TIDEC_LOG") {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Fatal Error: invalid TIDEC_LOG environment: {:?}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = tidec_log::Logger::init_logger(cfg) {
        eprintln!("Fatal Error: failed to initialize logger: {:?}", err);
        std::process::exit(1);
    }
}
