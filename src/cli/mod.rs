//! Command-line interface for the demonstration and chat UI servers

pub mod server;

pub use server::*;
