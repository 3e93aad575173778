use colored::Colorize;
use env_logger::Builder;
use log::Level;
use std::fmt;
use std::io::Write;

pub fn setup_logging(verbose: bool) {
    use log::LevelFilter;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // try_init: the library entry point may be called more than once in one process (tests).
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level) // Our crate: use requested level
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}

/// Logging handle given to each pipeline component at construction.
///
/// Every record goes out under the component's own target (e.g. `transponster::fetch`), so
/// `RUST_LOG=transponster::publish=debug` narrows output to one stage.
#[derive(Clone, Copy, Debug)]
pub struct StageLog {
    target: &'static str,
}

macro_rules! stage_target {
    ($stage:literal) => {
        concat!(env!("CARGO_PKG_NAME"), "::", $stage)
    };
}

impl StageLog {
    pub const FEED: StageLog = StageLog::new(stage_target!("feed"));
    pub const FETCH: StageLog = StageLog::new(stage_target!("fetch"));
    pub const TRANSFORM: StageLog = StageLog::new(stage_target!("transform"));
    pub const PUBLISH: StageLog = StageLog::new(stage_target!("publish"));
    pub const CONTROLLER: StageLog = StageLog::new(stage_target!("controller"));

    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: self.target, "{}", args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        log::info!(target: self.target, "{}", args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!(target: self.target, "{}", args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        log::error!(target: self.target, "{}", args);
    }
}
