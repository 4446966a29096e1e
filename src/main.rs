//! imp CLI
//!
//! Main entry point for the `imp` command.

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "imp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the imp language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL
    Repl,

    /// Run every unit of a source file in one session
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the desugared units of a source file without running them
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Emit JSON instead of the structural dump
        #[arg(long)]
        json: bool,
    },

    /// Show information about the interpreter
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => imp::repl::run(),
        Commands::Run { input } => run(&input),
        Commands::Parse { input, json } => parse(&input, json),
        Commands::Info => info(),
    }
}

fn read_source(input: &Path) -> Result<imp::SourceFile> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;
    Ok(imp::SourceFile::new(input.to_string_lossy(), content))
}

fn run(input: &Path) -> Result<()> {
    tracing::info!("Running {:?}", input);

    let file = read_source(input)?;
    let mut session = imp::Session::interactive();
    let outcomes = session.run_file(&file)?;
    tracing::debug!("Ran {} units", outcomes.len());
    Ok(())
}

fn parse(input: &Path, json: bool) -> Result<()> {
    let file = read_source(input)?;
    let tokens = imp::lexer::lex_file(&file)?;
    let units = imp::parser::parse_file(&tokens, &file)?;
    tracing::debug!("Parsed {} units", units.len());

    if json {
        let json = serde_json::to_string_pretty(&units)
            .map_err(|e| miette::miette!("Failed to serialize units: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    for unit in &units {
        match unit {
            imp::ast::TopLevel::Statement(expr) | imp::ast::TopLevel::Abstract(expr) => {
                println!("{}", expr)
            }
            imp::ast::TopLevel::Declaration { name, expr }
            | imp::ast::TopLevel::ProcedureDef { name, expr }
            | imp::ast::TopLevel::TemplateDef { name, expr }
            | imp::ast::TopLevel::ObjectAssignment { name, expr } => {
                println!("{} = {}", name, expr)
            }
            imp::ast::TopLevel::Quit => println!("#quit"),
            imp::ast::TopLevel::Multi => println!("#multi"),
        }
    }
    Ok(())
}

fn info() -> Result<()> {
    println!("imp v{}", imp::VERSION);
    println!();
    println!("Language:");
    println!("  - Persistent lexical environments with reference cells");
    println!("  - First-class functions and procedures");
    println!("  - Fixed-size arrays with index, length and map");
    println!("  - Single-inheritance class templates with abstract methods");
    println!("  - Scoped method dispatch through object bindings");
    Ok(())
}
