use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use quill::error::Diagnostics;
use quill::interpreter::Interpreter;
use quill::parser::Parser;
use quill::resolver::Resolver;
use quill::scanner::Scanner;
use quill::stmt::Stmt;
use quill::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Quill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints the statement tree
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Quill program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String via a memory map.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let metadata = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?;

    // Mapping a zero-length file is an error on some platforms.
    if metadata.len() == 0 {
        info!("File {:?} is empty", filename);

        return Ok(String::new());
    }

    let mmap = unsafe { Mmap::map(&file) }
        .context(format!("Failed to memory-map file {:?}", filename))?;
    let source = std::str::from_utf8(&mmap)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_string();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'quill::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("quill::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan `source` completely, printing every lexical error.  `None` means
/// at least one error was reported.
fn scan_all(source: &str) -> Option<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut clean = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => {
                clean = false;

                debug!("Scan debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    clean.then_some(tokens)
}

/// Parse `tokens`, printing every syntax error.
fn parse_all(tokens: Vec<Token>, first_id: usize) -> Option<(Vec<Stmt>, usize)> {
    let mut parser = Parser::resume_ids(tokens, first_id);

    match parser.parse() {
        Ok(statements) => Some((statements, parser.id_watermark())),
        Err(errors) => {
            for e in &errors {
                debug!("Parse debug: {}", e);

                eprintln!("{}", e);
            }

            None
        }
    }
}

/// Print every resolver diagnostic; `true` when execution may proceed.
fn report_diagnostics(diagnostics: &Diagnostics) -> bool {
    for diagnostic in diagnostics.entries() {
        eprintln!("{}", diagnostic);
    }

    !diagnostics.had_errors()
}

fn run_program(source: &str) -> i32 {
    let Some(tokens) = scan_all(source) else {
        return 65;
    };

    let Some((statements, _)) = parse_all(tokens, 0) else {
        return 65;
    };

    info!("Parsed {} statements", statements.len());

    let mut interpreter = Interpreter::new();
    let diagnostics = Resolver::new(&mut interpreter).resolve(&statements);

    if !report_diagnostics(&diagnostics) {
        debug!("Resolution failed, exiting with code 65");

        return 65;
    }

    match interpreter.interpret(&statements) {
        Ok(()) => {
            info!("Program executed successfully");

            0
        }

        Err(e) => {
            debug!("Runtime debug: {}", e);

            eprintln!("{}", e);

            70
        }
    }
}

fn run_repl() -> Result<()> {
    info!("Starting REPL");

    // One interpreter for the whole session: globals, the resolution
    // table, and node ids all persist across lines.
    let mut interpreter = Interpreter::new();
    let mut next_id: usize = 0;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        let Some(tokens) = scan_all(line) else {
            continue;
        };

        let Some((statements, watermark)) = parse_all(tokens, next_id) else {
            continue;
        };
        next_id = watermark;

        let diagnostics = Resolver::new(&mut interpreter).resolve(&statements);
        if !report_diagnostics(&diagnostics) {
            continue;
        }

        if let Err(e) = interpreter.interpret(&statements) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let source = read_file(filename)?;
                let mut tokens: Vec<Token> = Vec::new();
                let mut tokenized = true;

                for token in Scanner::new(&source) {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);

                            if json {
                                tokens.push(token);
                            } else {
                                println!("{}", token);
                            }
                        }

                        Err(e) => {
                            tokenized = false;

                            debug!("Tokenization debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                if json {
                    println!("{}", serde_json::to_string_pretty(&tokens)?);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let source = read_file(filename)?;

                let Some(tokens) = scan_all(&source) else {
                    std::process::exit(65);
                };

                let Some((statements, _)) = parse_all(tokens, 0) else {
                    std::process::exit(65);
                };

                info!("Parsed {} statements", statements.len());

                for statement in &statements {
                    println!("{:#?}", statement);
                }

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let source = read_file(filename)?;

                info!("Provided input:\n{}", source);

                let code = run_program(&source);
                if code != 0 {
                    std::process::exit(code);
                }
            }

            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Repl => run_repl()?,
    }

    Ok(())
}
