//! Runtime configuration read from the environment.
//!
//! | Variable                             | Default               |
//! |--------------------------------------|-----------------------|
//! | `CARDIOSCORE_MODEL_DIR`              | `models`              |
//! | `CARDIOSCORE_MODEL_PUBKEY_B64`       | unset (unverified)    |
//! | `CARDIOSCORE_LOG_MODE`               | `auto`                |
//! | `CARDIOSCORE_LOG_FILE`               | `cardioscore.log`     |

use std::path::PathBuf;

use crate::adapters::ArtifactConfig;

pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_LOG_FILE: &str = "cardioscore.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal, stderr otherwise.
    #[default]
    Auto,
    File,
    /// Stdout carries the report, so console logs go to stderr.
    Stderr,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stderr" | "stdout" => Self::Stderr,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stderr => false,
            Self::Auto => interactive,
        }
    }
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub artifacts: ArtifactConfig,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`.
    ///
    /// # Security
    ///
    /// Artifacts are only signature-checked when `CARDIOSCORE_MODEL_PUBKEY_B64`
    /// is set. Without it they load unverified.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            artifacts: ArtifactConfig {
                model_dir: non_empty("CARDIOSCORE_MODEL_DIR")
                    .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from),
                trusted_key_b64: non_empty("CARDIOSCORE_MODEL_PUBKEY_B64"),
            },
            log_mode: non_empty("CARDIOSCORE_LOG_MODE")
                .map(|v| LogMode::parse(&v))
                .unwrap_or_default(),
            log_file: non_empty("CARDIOSCORE_LOG_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
        }
    }
}
