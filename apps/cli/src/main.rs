//! REPL binary for the allocator and cache replacement simulator.

mod format;
mod interpreter;
mod session;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write as _};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use interpreter::Outcome;
use session::Session;

/// Interactive simulator for partition/buddy allocation and cache
/// replacement policies.
#[derive(Debug, Parser)]
#[command(name = "allocsim", version, about)]
struct Args {
    /// Run commands from this file instead of reading from stdin.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Prompt string printed before each command.
    #[arg(long, default_value = "> ")]
    prompt: String,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
}

fn run<R: BufRead>(mut input: R, prompt: &str, interactive: bool) -> anyhow::Result<()> {
    let mut session = Session::default();
    let stdout = io::stdout();

    if interactive {
        println!("Memory Management Simulator Ready. Type 'help' for commands.");
    }

    let mut line = String::new();
    loop {
        if interactive {
            let mut out = stdout.lock();
            write!(out, "{prompt}")?;
            out.flush()?;
        }

        line.clear();
        let bytes_read = input.read_line(&mut line).context("reading input")?;
        if bytes_read == 0 {
            break;
        }

        match interpreter::execute(&mut session, line.trim_end()) {
            Outcome::Continue(text) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            Outcome::Exit => break,
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("opening script file {}", path.display()))?;
            run(BufReader::new(file), &args.prompt, false)
        }
        None => run(BufReader::new(io::stdin().lock()), &args.prompt, true),
    }
}
