pub mod cli;
pub mod commands;
pub mod report;

pub use arc_accounting_shared as accounting;
