//! Decode configuration and session state.
//!
//! - [`DecodeConfig`] - serde-loadable tunables
//! - [`DecodeSession`] - per-invocation caches and warn-once bookkeeping

mod config;
mod session;

pub use config::{DecodeConfig, CONFIG_FILE_NAME};
pub use session::DecodeSession;
