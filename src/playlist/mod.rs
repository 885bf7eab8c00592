//! M3U playlist handling
//!
//! A playlist is plain text fetched from a remote URL; this module turns it
//! into an ordered list of [`Channel`] records ready for the player. Parsing
//! is pure and never fails: malformed directives degrade to absent fields.

pub mod channel;
pub mod parser;

pub use channel::Channel;
pub use parser::{groups, parse, search};
