//! Manager error types and their process exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Manager-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes of the `tapewheel` binary.
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const CLI_ARGS: i32 = 1;
    pub const DIR_NOT_FOUND: i32 = 2;
    pub const CONFIG_LOAD: i32 = 3;
    pub const STATE_SAVE: i32 = 4;
    pub const BACKUP_FAILED: i32 = 5;
}

/// Everything that can end a run early or mark it failed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("failed to load document {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("no archive named '{0}' in the configuration directory")]
    ArchiveNotFound(String),

    #[error("host {0} did not answer any echo request")]
    PingHost(String),

    #[error("transport failure on {host}: {reason}")]
    Transport { host: String, reason: String },

    #[error("no byte count in worker results for {target}")]
    ParseResults { target: String },

    #[error("worker killed while archiving {target}")]
    WorkerKilled { target: String },

    #[error("cannot write state document {path}: {reason}")]
    StateSave { path: String, reason: String },

    #[error("{failed} of {total} archives failed")]
    BackupFailed { failed: usize, total: usize },

    #[error(transparent)]
    Core(#[from] tapewheel_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The exit code this error maps to when it reaches `main`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DirNotFound(_) => exit_code::DIR_NOT_FOUND,
            Self::ConfigLoad { .. } | Self::ArchiveNotFound(_) | Self::Core(_) => {
                exit_code::CONFIG_LOAD
            }
            Self::StateSave { .. } | Self::Io(_) => exit_code::STATE_SAVE,
            _ => exit_code::BACKUP_FAILED,
        }
    }

    pub fn transport(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            host: host.into(),
            reason: reason.into(),
        }
    }

    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
