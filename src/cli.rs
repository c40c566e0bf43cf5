use arc_accounting_shared::Dimension;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "A-REX accounting statistics",
    long_about = "Job statistics over the A-REX accounting database"
)]
pub struct CliArguments {
    /// Path to the accounting database
    ///
    /// Example: /var/spool/arc/jobstatus/accounting/accounting.db
    #[arg(short = 'd', long = "db", env = "ARC_ACCOUNTING_DB")]
    pub db_path: PathBuf,

    /// How long to wait on a locked database, in milliseconds
    #[arg(long, env = "ARC_ACCOUNTING_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Log filter directive (error, warn, info, debug, trace)
    #[arg(long, env = "ARC_ACCOUNTING_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the values available for filtering
    List {
        #[arg(value_enum)]
        dimension: DimensionArg,
    },
    /// Show aggregated job statistics
    Stats(StatsArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionArg {
    Queues,
    Users,
    Vos,
    Statuses,
    EndpointTypes,
}

impl From<DimensionArg> for Dimension {
    fn from(arg: DimensionArg) -> Self {
        match arg {
            DimensionArg::Queues => Dimension::Queue,
            DimensionArg::Users => Dimension::User,
            DimensionArg::Vos => Dimension::Vo,
            DimensionArg::Statuses => Dimension::Status,
            DimensionArg::EndpointTypes => Dimension::EndpointType,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Submission queue (repeatable)
    #[arg(long = "queue")]
    pub queues: Vec<String>,

    /// User subject DN (repeatable)
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// WLCG VO name (repeatable)
    #[arg(long = "vo")]
    pub vos: Vec<String>,

    /// Job end state (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// Submission endpoint interface type (repeatable)
    #[arg(long = "endpoint-type")]
    pub endpoint_types: Vec<String>,

    /// Only jobs submitted after this time (UTC)
    ///
    /// Example: 2024-01-31 or '2024-01-31 12:00:00' or 2024-01-31T12:00:00Z
    #[arg(long, value_parser = parse_time)]
    pub start_from: Option<DateTime<Utc>>,

    /// Only jobs finished before this time (UTC)
    #[arg(long, value_parser = parse_time)]
    pub end_till: Option<DateTime<Utc>>,

    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

pub fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!(
        "invalid time '{}', expected YYYY-MM-DD, 'YYYY-MM-DD HH:MM:SS' or RFC 3339",
        value
    ))
}
