//! rtr interpreter command-line.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop.
//!
//! When called with arguments, it interprets the corresponding files in a single interpreter
//! session (so variables bound by one file are visible to the next).
//!
//! `RTR_TIMEOUT_SECS` overrides the request timeout (`0` disables it).  `RUST_LOG` controls
//! diagnostics written to stderr.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::time::Duration;

use anyhow::{self, Context};
use tracing_subscriber::EnvFilter;

use rtr::http::HttpConfig;
use rtr::interpreter::Interpreter;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = http_config()?;
    let args = env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        run_all_files(args, config)?;
    } else {
        run_prompt(config)?;
    }
    Ok(())
}

fn http_config() -> Result<HttpConfig, anyhow::Error> {
    let mut config = HttpConfig::default();
    if let Ok(secs) = env::var("RTR_TIMEOUT_SECS") {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("invalid RTR_TIMEOUT_SECS: {}", secs))?;
        config.timeout = if secs == 0 {
            None
        } else {
            Some(Duration::from_secs(secs))
        };
    }
    Ok(config)
}

fn run_all_files(paths: Vec<String>, config: HttpConfig) -> Result<(), anyhow::Error> {
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::with_config(&mut interp_stdout, config);

    for p in &paths {
        let source = fs::read_to_string(p).with_context(|| format!("failed to open {}", p))?;
        interp
            .eval(&source)
            .with_context(|| format!("failed to run {}", p))?;
    }

    Ok(())
}

/// Read-evaluate loop.  A line that leaves a block open is held back and completed by the
/// following lines before anything runs.
fn run_prompt(config: HttpConfig) -> Result<(), io::Error> {
    let stdin = io::stdin();
    let mut repl_stdout = io::stdout();
    let mut interp_stdout = io::stdout();

    let mut interp = Interpreter::with_config(&mut interp_stdout, config);

    let mut pending = String::new();
    let mut line = String::new();
    loop {
        let prompt = if pending.is_empty() { "rtr> " } else { "...  " };
        repl_stdout.write_all(prompt.as_bytes())?;
        repl_stdout.flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        pending.push_str(&line);

        match interp.eval(&pending) {
            Ok(()) => (),
            Err(e) if e.is_incomplete_input() => continue,
            Err(e) if e.is_request_failure() => {
                eprintln!("{}", e);
                eprintln!("(names bound before the request are still defined)");
            }
            Err(e) => eprintln!("{}", e),
        }
        pending.clear();
    }

    Ok(())
}
