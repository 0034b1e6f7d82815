//! Database connectivity and schema bootstrap.

pub mod connection;

pub use connection::Database;
