mod accounting_db;
mod error;

pub use accounting_db::{AccountingConfig, AccountingDb, DEFAULT_BUSY_TIMEOUT};
pub use error::{AccountingError, Result};
