//! The two phases of a request: search a connector, then acquire the
//! selected candidate.

mod acquire;
mod search;

pub use acquire::*;
pub use search::*;
