//! Command-line grammar and action mapping
//!
//! One clap command tree serves both shell mode (`tandem begin ...`) and the
//! REPL (`begin ...`). Row payloads are JSON objects.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tandem_concurrency::OpRequest;
use tandem_core::{RecordId, Row};

/// What one parsed command asks the session to do
#[derive(Debug, Clone)]
pub enum CliAction {
    /// Begin a transaction
    Begin,
    /// Commit the open transaction
    Commit,
    /// Roll back the open transaction
    Rollback,
    /// Execute a raw operation
    Op(OpRequest),
    /// Print manager statistics
    Stats,
    /// Seed sample data
    Seed,
    /// Transfer money between accounts
    Transfer {
        /// Debited account
        from: RecordId,
        /// Credited account
        to: RecordId,
        /// Amount in minor units
        amount: i64,
        /// Ledger note
        note: String,
    },
    /// Deposit into an account
    Deposit {
        /// Credited account
        account: RecordId,
        /// Amount in minor units
        amount: i64,
    },
    /// Withdraw from an account
    Withdraw {
        /// Debited account
        account: RecordId,
        /// Amount in minor units
        amount: i64,
    },
    /// Place an order
    Order {
        /// Ordering user
        user: RecordId,
        /// Paying account
        account: RecordId,
        /// `(product, quantity)` lines
        items: Vec<(RecordId, i64)>,
    },
}

/// Meta-commands handled by the REPL itself
#[derive(Debug, Clone, PartialEq)]
pub enum MetaCommand {
    /// Leave the REPL
    Quit,
    /// Print help
    Help,
    /// Switch the client token
    Client(String),
}

/// Recognize `:quit`-style meta-commands before clap sees the line
pub fn check_meta_command(line: &str) -> Option<MetaCommand> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        ":quit" | ":q" | "exit" | "quit" => Some(MetaCommand::Quit),
        ":help" | ":h" | "help" => Some(MetaCommand::Help),
        ":client" => parts.next().map(|c| MetaCommand::Client(c.to_string())),
        _ => None,
    }
}

fn key_arg() -> Arg {
    Arg::new("key")
        .value_parser(clap::value_parser!(i64))
        .required(true)
}

fn table_args() -> [Arg; 2] {
    [
        Arg::new("db").required(true),
        Arg::new("table").required(true),
    ]
}

/// The shared subcommand tree
pub fn build_repl_cmd() -> Command {
    Command::new("tandem")
        .no_binary_name(true)
        .subcommand_required(true)
        .disable_help_flag(true)
        .subcommand(Command::new("begin").about("Begin a transaction"))
        .subcommand(Command::new("commit").about("Commit the open transaction"))
        .subcommand(Command::new("rollback").about("Roll back the open transaction"))
        .subcommand(
            Command::new("select")
                .about("Read one row by key, or a whole table")
                .args(table_args())
                .arg(
                    Arg::new("key")
                        .value_parser(clap::value_parser!(i64))
                        .required(false),
                ),
        )
        .subcommand(
            Command::new("insert")
                .about("Insert a row from a JSON object")
                .args(table_args())
                .arg(Arg::new("row").required(true)),
        )
        .subcommand(
            Command::new("update")
                .about("Patch a row from a JSON object")
                .args(table_args())
                .arg(key_arg())
                .arg(Arg::new("patch").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a row by key")
                .args(table_args())
                .arg(key_arg()),
        )
        .subcommand(Command::new("stats").about("Print manager statistics"))
        .subcommand(Command::new("seed").about("Insert the sample data set"))
        .subcommand(
            Command::new("transfer")
                .about("Move money between accounts (minor units)")
                .arg(Arg::new("from").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("to").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("amount").value_parser(clap::value_parser!(i64)).required(true))
                .arg(
                    Arg::new("note")
                        .long("note")
                        .action(ArgAction::Set)
                        .default_value("transfer"),
                ),
        )
        .subcommand(
            Command::new("deposit")
                .about("Credit an account (minor units)")
                .arg(Arg::new("account").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("amount").value_parser(clap::value_parser!(i64)).required(true)),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Debit an account (minor units)")
                .arg(Arg::new("account").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("amount").value_parser(clap::value_parser!(i64)).required(true)),
        )
        .subcommand(
            Command::new("order")
                .about("Place an order; items are PRODUCT:QTY pairs")
                .arg(Arg::new("user").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("account").value_parser(clap::value_parser!(i64)).required(true))
                .arg(Arg::new("items").required(true).num_args(1..)),
        )
}

/// The top-level binary grammar: global flags plus the shared subcommands
pub fn build_cli() -> Command {
    build_repl_cmd()
        .no_binary_name(false)
        .subcommand_required(false)
        .disable_help_flag(false)
        .about("Transactional shell over the twin in-memory stores")
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit JSON instead of human-readable output"),
        )
        .arg(
            Arg::new("client")
                .long("client")
                .action(ArgAction::Set)
                .default_value("shell")
                .help("Client token transactions run under"),
        )
        .arg(
            Arg::new("no-seed")
                .long("no-seed")
                .action(ArgAction::SetTrue)
                .help("Start with empty tables instead of the sample data"),
        )
}

fn parse_row(text: &str) -> Result<Row, String> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON payload: {}", e))?;
    Row::from_json(&json).ok_or_else(|| "payload must be a flat JSON object".to_string())
}

fn parse_items(raw: Vec<&String>) -> Result<Vec<(RecordId, i64)>, String> {
    raw.into_iter()
        .map(|pair| {
            let (product, qty) = pair
                .split_once(':')
                .ok_or_else(|| format!("expected PRODUCT:QTY, got {}", pair))?;
            let product = product
                .parse::<i64>()
                .map_err(|_| format!("bad product id in {}", pair))?;
            let qty = qty
                .parse::<i64>()
                .map_err(|_| format!("bad quantity in {}", pair))?;
            Ok((product, qty))
        })
        .collect()
}

/// Map parsed matches to an action
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| "no command given".to_string())?;
    let action = match name {
        "begin" => CliAction::Begin,
        "commit" => CliAction::Commit,
        "rollback" => CliAction::Rollback,
        "stats" => CliAction::Stats,
        "seed" => CliAction::Seed,
        "select" => {
            let db = sub.get_one::<String>("db").expect("required").clone();
            let table = sub.get_one::<String>("table").expect("required").clone();
            match sub.get_one::<i64>("key") {
                Some(key) => CliAction::Op(OpRequest::select(db, table, *key)),
                None => CliAction::Op(OpRequest::scan(db, table)),
            }
        }
        "insert" => {
            let db = sub.get_one::<String>("db").expect("required").clone();
            let table = sub.get_one::<String>("table").expect("required").clone();
            let row = parse_row(sub.get_one::<String>("row").expect("required"))?;
            CliAction::Op(OpRequest::insert(db, table, row))
        }
        "update" => {
            let db = sub.get_one::<String>("db").expect("required").clone();
            let table = sub.get_one::<String>("table").expect("required").clone();
            let key = *sub.get_one::<i64>("key").expect("required");
            let patch = parse_row(sub.get_one::<String>("patch").expect("required"))?;
            CliAction::Op(OpRequest::update(db, table, key, patch))
        }
        "delete" => {
            let db = sub.get_one::<String>("db").expect("required").clone();
            let table = sub.get_one::<String>("table").expect("required").clone();
            let key = *sub.get_one::<i64>("key").expect("required");
            CliAction::Op(OpRequest::delete(db, table, key))
        }
        "transfer" => CliAction::Transfer {
            from: *sub.get_one::<i64>("from").expect("required"),
            to: *sub.get_one::<i64>("to").expect("required"),
            amount: *sub.get_one::<i64>("amount").expect("required"),
            note: sub.get_one::<String>("note").expect("defaulted").clone(),
        },
        "deposit" => CliAction::Deposit {
            account: *sub.get_one::<i64>("account").expect("required"),
            amount: *sub.get_one::<i64>("amount").expect("required"),
        },
        "withdraw" => CliAction::Withdraw {
            account: *sub.get_one::<i64>("account").expect("required"),
            amount: *sub.get_one::<i64>("amount").expect("required"),
        },
        "order" => {
            let items = parse_items(
                sub.get_many::<String>("items")
                    .expect("required")
                    .collect(),
            )?;
            CliAction::Order {
                user: *sub.get_one::<i64>("user").expect("required"),
                account: *sub.get_one::<i64>("account").expect("required"),
                items,
            }
        }
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(action)
}
