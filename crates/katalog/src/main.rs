//! Command-line interface for inspecting and compiling katalog queries.

use std::{fs, process::ExitCode};

use clap::{Parser, Subcommand};
use katalog_compile::{BoostConfig, FieldMapping, compile_query};
use katalog_query::{normalize, parse, tokenize};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "katalog")]
#[command(about = "Query-language tools for the katalog search API")]
/// Top-level CLI options.
struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// Supported `katalog` subcommands.
enum Commands {
    /// Parse a query and print its normalized AST
    Parse {
        /// The query string
        query: String,

        /// Print the tree before normalization
        #[arg(long)]
        raw: bool,

        /// Print the token stream instead of a tree
        #[arg(long)]
        tokens: bool,
    },

    /// Compile a query into a filter query and print it as JSON
    Compile {
        /// The query string
        query: String,

        /// Path to a JSON config with field mappings and boost settings
        #[arg(long)]
        config: Option<String>,
    },
}

/// The JSON config file for `katalog compile`.
#[derive(Debug, Default, Deserialize)]
struct CompileConfig {
    /// Field alias mappings.
    #[serde(default)]
    fields: FieldMapping,

    /// Free-text boost settings.
    #[serde(default)]
    boost: BoostConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { query, raw, tokens } => cmd_parse(&query, raw, tokens),
        Commands::Compile { query, config } => cmd_compile(&query, config.as_deref()),
    }
}

/// Implements the `katalog parse` command.
fn cmd_parse(query: &str, raw: bool, tokens: bool) -> ExitCode {
    if tokens {
        match tokenize(query) {
            Ok(tokens) => {
                for token in tokens {
                    println!("{:>4}  {:?} {:?}", token.offset, token.kind, token.value);
                }
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    match parse(query) {
        Ok(tree) => {
            let tree = if raw { tree } else { normalize(tree) };
            print!("{tree}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Implements the `katalog compile` command.
fn cmd_compile(query: &str, config_path: Option<&str>) -> ExitCode {
    let config = match config_path {
        Some(path) => {
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) => {
                    eprintln!("error: failed to read {path}: {e}");
                    return ExitCode::FAILURE;
                }
            };
            match serde_json::from_str::<CompileConfig>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error: failed to parse {path}: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => CompileConfig::default(),
    };

    match compile_query(query, &config.fields, &config.boost) {
        Ok(compiled) => {
            match serde_json::to_string_pretty(&compiled) {
                Ok(pretty) => println!("{pretty}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
