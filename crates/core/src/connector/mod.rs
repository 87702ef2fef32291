//! Connectors: a backend client paired with its deployment settings.
//!
//! The registry is the declarative table the workflows resolve against,
//! either by the command keyword of an incoming search or by the connector
//! name carried in a correlation token.

mod config;
mod registry;

pub use config::*;
pub use registry::*;
