//! Tandem shell: transactional CLI over the twin in-memory stores.
//!
//! Three modes:
//! - **Shell mode**: `tandem [flags] COMMAND` runs a single command and exits
//! - **REPL mode**: `tandem [flags]` is an interactive prompt (stdin is a TTY)
//! - **Pipe mode**: `echo "transfer 1 2 100" | tandem` executes line by line

mod execute;
mod format;
mod parse;
mod repl;
mod state;

use std::io::IsTerminal;
use std::process;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tandem_concurrency::TransactionManager;
use tandem_services::seed_sample_data;
use tandem_storage::Catalog;

use execute::execute_action;
use format::OutputMode;
use parse::{build_cli, matches_to_action};
use state::SessionState;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TANDEM_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let client = matches
        .get_one::<String>("client")
        .expect("defaulted")
        .clone();

    let manager = Arc::new(TransactionManager::new(Catalog::bootstrap()));
    if !matches.get_flag("no-seed") {
        if let Err(e) = seed_sample_data(manager.store()) {
            eprintln!("(error) seeding failed: {}", e);
            process::exit(1);
        }
    }

    let mut state = SessionState::new(manager, client);

    if matches.subcommand().is_some() {
        // shell mode: one command, then exit
        let exit = match matches_to_action(&matches) {
            Ok(action) => {
                if execute_action(action, &mut state, mode) {
                    0
                } else {
                    1
                }
            }
            Err(e) => {
                eprintln!("(error) {}", e);
                2
            }
        };
        process::exit(exit);
    } else if std::io::stdin().is_terminal() {
        repl::run_repl(&mut state, mode);
    } else {
        process::exit(repl::run_pipe(&mut state, mode));
    }
}
