//! Configuration for the hello and UI servers

pub mod settings;

pub use settings::*;
