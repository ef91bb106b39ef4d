//! REPL and pipe modes
//!
//! Interactive mode: prompt, meta-commands, history. Pipe mode: read lines
//! from stdin, execute each, stop on end of input.

use std::io::{self, BufRead};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::execute::execute_action;
use crate::format::{format_error, OutputMode};
use crate::parse::{build_repl_cmd, check_meta_command, matches_to_action, MetaCommand};
use crate::state::SessionState;

/// Run the interactive REPL
pub fn run_repl(state: &mut SessionState, mode: OutputMode) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("(error) cannot start interactive mode: {}", e);
            return;
        }
    };

    loop {
        match rl.readline(&state.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if let Some(meta) = check_meta_command(trimmed) {
                    match meta {
                        MetaCommand::Quit => break,
                        MetaCommand::Help => print_help(),
                        MetaCommand::Client(client) => {
                            state.set_client(&client);
                            println!("client is now {}", client);
                        }
                    }
                    continue;
                }

                run_line(trimmed, state, mode);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C, show a fresh prompt
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("(error) {:?}", err);
                break;
            }
        }
    }
}

/// Execute lines from stdin until end of input; returns the exit code
pub fn run_pipe(state: &mut SessionState, mode: OutputMode) -> i32 {
    let stdin = io::stdin();
    let mut exit = 0;
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match check_meta_command(trimmed) {
            Some(MetaCommand::Quit) => break,
            Some(MetaCommand::Help) => print_help(),
            Some(MetaCommand::Client(client)) => state.set_client(&client),
            None => {
                if !run_line(trimmed, state, mode) {
                    exit = 1;
                }
            }
        }
    }
    exit
}

/// Parse and execute one command line; true on success
fn run_line(line: &str, state: &mut SessionState, mode: OutputMode) -> bool {
    let tokens = match shlex::split(line) {
        Some(tokens) if !tokens.is_empty() => tokens,
        Some(_) => return true,
        None => {
            eprintln!("{}", format_error(&"invalid quoting", mode));
            return false;
        }
    };

    let matches = match build_repl_cmd().try_get_matches_from(tokens) {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("{}", e);
            return false;
        }
    };

    match matches_to_action(&matches) {
        Ok(action) => execute_action(action, state, mode),
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            false
        }
    }
}

fn print_help() {
    println!(
        "\
transactions:
  begin | commit | rollback
raw operations (payloads are flat JSON objects):
  select DB TABLE [KEY]
  insert DB TABLE ROW
  update DB TABLE KEY PATCH
  delete DB TABLE KEY
services:
  transfer FROM TO AMOUNT [--note TEXT]
  deposit ACCOUNT AMOUNT
  withdraw ACCOUNT AMOUNT
  order USER ACCOUNT PRODUCT:QTY [PRODUCT:QTY ...]
session:
  stats | seed | :client TOKEN | :help | :quit"
    );
}
