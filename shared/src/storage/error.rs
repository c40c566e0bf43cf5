use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountingError {
    #[error("Accounting database does not exist at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to open accounting database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Accounting database connection is closed")]
    Closed,

    #[error("Accounting query failed: {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, AccountingError>;
