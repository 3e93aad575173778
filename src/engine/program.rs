//! External transform program: one positional argument (the input dir), cwd = batch scratch
//! root, results in `output/`, exit 0 on success.

use anyhow::{Context, Result, bail};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

use crate::pipeline::FailureKind;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{program} not found: {source}")]
    NotFound {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program} is not executable: {source}")]
    PermissionDenied {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("could not start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransformError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransformError::NotFound { .. } => FailureKind::ProgramNotFound,
            TransformError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            TransformError::Failed { .. } | TransformError::Spawn { .. } => {
                FailureKind::TransformFailed
            }
        }
    }
}

/// Captured output of a successful run (for diagnostics).
#[derive(Debug, Default)]
pub struct ProgramOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Clone, Debug)]
pub struct Program {
    path: PathBuf,
}

impl Program {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve to an absolute path (the program runs with a different cwd).
    pub fn resolve(path: &Path) -> Result<Self> {
        let abs = std::path::absolute(path)
            .with_context(|| format!("resolve script path {}", path.display()))?;
        Ok(Self::new(abs))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Startup check: the program must exist.
    pub fn check(&self) -> Result<()> {
        if !self.path.exists() {
            bail!("Script {} does not exist, exiting", self.path.display());
        }
        Ok(())
    }

    /// Run against a batch scratch root: cwd = `working_dir`, sole argument = `input_dir`.
    pub fn run(&self, working_dir: &Path, input_dir: &Path) -> Result<ProgramOutput, TransformError> {
        let output = Command::new(&self.path)
            .arg(input_dir)
            .current_dir(working_dir)
            .output()
            .map_err(|source| self.classify_spawn_error(source))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(TransformError::Failed {
                program: self.path.clone(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(ProgramOutput { stdout, stderr })
    }

    fn classify_spawn_error(&self, source: io::Error) -> TransformError {
        let program = self.path.clone();
        match source.kind() {
            io::ErrorKind::NotFound => TransformError::NotFound { program, source },
            io::ErrorKind::PermissionDenied => TransformError::PermissionDenied { program, source },
            _ => TransformError::Spawn { program, source },
        }
    }
}
