//! PageWatch - watch web pages for a phrase and notify on detection

pub mod bot;
pub mod channels;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod scheduler;
pub mod utils;

pub use config::Config;
pub use error::{FetchError, Result, WatchError};
