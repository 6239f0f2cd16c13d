//! CLI commands module.

mod embed;
mod info;
mod util;

pub use embed::EmbedCommand;
pub use info::InfoCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
