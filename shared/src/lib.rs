pub mod filter;
pub mod lookup;
pub mod storage;
pub mod types;
pub mod schema;

pub use filter::FilterPredicate;
pub use lookup::{EndpointTable, IdNameTable, LookupCache};
pub use storage::{AccountingConfig, AccountingDb, AccountingError};
pub use types::*;
pub use schema::*;
