//! Engine module: CLI surface, external program runner, progress display

pub mod arg_parser;
pub mod cli;
pub mod program;
pub mod progress;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use program::{Program, ProgramOutput, TransformError};
