//! The REPL/file-runner driver: argument parsing, logging setup, and error rendering over the
//! core's public API (lex → parse → eval → inspect). None of this is part of the respecified
//! language; it is the ambient surface every finished interpreter crate needs around its core.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::env::{Environment, EnvRef};
use crate::error::{EvalError, ParseError};
use crate::eval::eval_program;
use crate::parser::parse;
use crate::value::inspect;

const PROMPT: &str = ">> ";

/// Q/Hermes: a small dynamically-typed expression language.
#[derive(Debug, Parser)]
#[command(name = "hermes", version, about)]
pub struct Cli {
    /// Source file to run. Omit to start an interactive REPL.
    pub path: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

/// Parses arguments, initializes logging, and runs either a single file or the REPL.
pub fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    match &cli.path {
        Some(path) => run_file(path),
        None => {
            run_repl(io::stdin().lock(), io::stdout());
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: &PathBuf) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let env = Environment::new();
    match run_source(&source, &env) {
        Ok(value) => {
            println!("{}", inspect(&value));
            ExitCode::SUCCESS
        }
        Err(messages) => {
            for message in messages {
                eprintln!("{message}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Reads lines from `input`, evaluating each against an environment that persists across lines,
/// printing `inspect(value)` on success or the error message on failure. Prompt is `>> `; there
/// are no flags and no persisted state beyond the environment itself.
fn run_repl(input: impl BufRead, mut output: impl Write) {
    let env = Environment::new();
    let mut lines = input.lines();

    loop {
        let _ = write!(output, "{PROMPT}");
        let _ = output.flush();

        let Some(Ok(line)) = lines.next() else {
            return;
        };

        match run_source(&line, &env) {
            Ok(value) => {
                let _ = writeln!(output, "{}", inspect(&value));
            }
            Err(messages) => {
                for message in messages {
                    let _ = writeln!(output, "{message}");
                }
            }
        }
    }
}

/// Runs `source` to completion against `env`, returning rendered error messages on failure. A
/// non-empty parse error list means the AST is never handed to the evaluator — a program that
/// fails to parse is never trusted enough to run.
fn run_source(source: &str, env: &EnvRef) -> Result<crate::value::Value, Vec<String>> {
    let (program, parse_errors) = parse(source);
    if !parse_errors.is_empty() {
        return Err(parse_errors.iter().map(ParseError::to_string).collect());
    }

    eval_program(&program, env).map_err(|err: EvalError| vec![err.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl_transcript(input: &str) -> String {
        let mut output = Vec::new();
        run_repl(input.as_bytes(), &mut output);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn evaluates_each_line_and_preserves_environment() {
        let transcript = repl_transcript("var x = 5;\nx + 1\n");
        assert!(transcript.contains("5"));
        assert!(transcript.contains("6"));
    }

    #[test]
    fn prints_eval_errors_and_keeps_going() {
        let transcript = repl_transcript("break;\nvar x = 1;\nx\n");
        assert!(transcript.contains("break outside of a loop"));
        assert!(transcript.contains('1'));
    }

    #[test]
    fn prints_parse_errors() {
        let transcript = repl_transcript("var = ;\n");
        assert!(transcript.contains("expected next token"));
    }
}
