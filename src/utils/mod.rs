pub mod config;
pub mod logger;
pub mod transponster_toml;

pub use config::*;
pub use logger::{StageLog, setup_logging};
