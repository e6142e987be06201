pub mod aggregate;
pub mod api;
pub mod config;
pub mod duck;
pub mod error;
pub mod fetch;
pub mod init;
pub mod load;
pub mod query;
pub mod schema;
pub mod score;

#[cfg(test)]
mod testutil;

pub use error::{HexError, Result};
