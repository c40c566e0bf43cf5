use arc_accounting::cli::{CliArguments, Command};
use arc_accounting::commands;
use arc_accounting_shared::{AccountingConfig, AccountingDb};
use clap::Parser;
use std::process;
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

macro_rules! fatal {
    ($err:expr, $msg:literal) => {{
        error!(fatal = true, error = %$err, $msg);
        process::exit(1);
    }};
    ($err:expr, $msg:literal, $($key:tt = $val:expr),+) => {{
        error!(fatal = true, error = %$err, $($key = %$val),+, $msg);
        process::exit(1);
    }};
}

fn main() {
    let cli_args = CliArguments::parse();

    let env_filter = EnvFilter::try_new(&cli_args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let config = AccountingConfig {
        db_path: cli_args.db_path.clone(),
        busy_timeout: Duration::from_millis(cli_args.busy_timeout_ms),
    };

    let mut db = AccountingDb::open_with(&config).unwrap_or_else(|e| {
        fatal!(e, "Failed to open accounting database", path = config.db_path.display())
    });

    debug!(path = %config.db_path.display(), "Accounting database opened");

    let output = match &cli_args.command {
        Command::List { dimension } => commands::list(&mut db, (*dimension).into()),
        Command::Stats(args) => commands::stats(&mut db, args),
    };

    db.close();

    match output {
        Ok(text) => print!("{}", text),
        Err(e) => fatal!(e, "Failed to produce accounting report"),
    }
}
