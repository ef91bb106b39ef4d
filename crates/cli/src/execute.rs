//! Dispatch parsed actions against the session

use crate::format::{format_error, format_ok, format_result, format_stats, OutputMode};
use crate::parse::CliAction;
use crate::state::SessionState;
use tandem_services::seed_sample_data;

/// Execute one action, printing its outcome; true on success
pub fn execute_action(action: CliAction, state: &mut SessionState, mode: OutputMode) -> bool {
    match action {
        CliAction::Begin => match state.begin() {
            Ok(tid) => {
                println!("{}", format_ok(&format!("began {}", tid), mode));
                true
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                false
            }
        },
        CliAction::Commit => match state.commit() {
            Ok(()) => {
                println!("{}", format_ok("committed", mode));
                true
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                false
            }
        },
        CliAction::Rollback => match state.rollback() {
            Ok(()) => {
                println!("{}", format_ok("rolled back", mode));
                true
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                false
            }
        },
        CliAction::Op(request) => match state.execute(request) {
            Ok(result) => {
                println!("{}", format_result(&result, mode));
                true
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                false
            }
        },
        CliAction::Stats => {
            println!("{}", format_stats(&state.statistics(), mode));
            true
        }
        CliAction::Seed => match seed_sample_data(state.manager().store()) {
            Ok(()) => {
                println!("{}", format_ok("sample data seeded", mode));
                true
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                false
            }
        },
        CliAction::Transfer {
            from,
            to,
            amount,
            note,
        } => {
            let client = state.client().to_string();
            match state.bank().transfer(&client, from, to, amount, &note) {
                Ok(entry) => {
                    println!("{}", format_ok(&format!("transfer recorded as {}", entry), mode));
                    true
                }
                Err(e) => {
                    eprintln!("{}", format_error(&e, mode));
                    false
                }
            }
        }
        CliAction::Deposit { account, amount } => {
            let client = state.client().to_string();
            match state.bank().deposit(&client, account, amount, "deposit") {
                Ok(entry) => {
                    println!("{}", format_ok(&format!("deposit recorded as {}", entry), mode));
                    true
                }
                Err(e) => {
                    eprintln!("{}", format_error(&e, mode));
                    false
                }
            }
        }
        CliAction::Withdraw { account, amount } => {
            let client = state.client().to_string();
            match state.bank().withdraw(&client, account, amount, "withdrawal") {
                Ok(entry) => {
                    println!(
                        "{}",
                        format_ok(&format!("withdrawal recorded as {}", entry), mode)
                    );
                    true
                }
                Err(e) => {
                    eprintln!("{}", format_error(&e, mode));
                    false
                }
            }
        }
        CliAction::Order {
            user,
            account,
            items,
        } => {
            let client = state.client().to_string();
            match state.inventory().place_order(&client, user, account, &items) {
                Ok(order) => {
                    println!("{}", format_ok(&format!("order {} confirmed", order), mode));
                    true
                }
                Err(e) => {
                    eprintln!("{}", format_error(&e, mode));
                    false
                }
            }
        }
    }
}
