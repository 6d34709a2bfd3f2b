//! Small helpers shared by the CLI.

pub mod format;

pub use format::format_size;
