pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod ledger;
pub mod model;
pub mod reminder;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use db::Db;
pub use error::{Error, ErrorType, Result};
pub use ledger::{parse_position, Ledger};
pub use model::{Amount, Expense, Task};
