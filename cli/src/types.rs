use std::io;
use std::path::PathBuf;
use std::time::Duration;

use pwclip_core::{ClipboardError, KeyError, SettingsError};
use thiserror::Error;

/// Where key material comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Ask for a passphrase on the terminal
    Prompt,
    /// Read key material from a file
    File(PathBuf),
}

/// Where the rendered password goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Print it on standard output
    Stdout,
    /// Place it on the clipboard for the exposure window
    Clipboard,
}

/// Everything one invocation needs, fixed once the arguments are parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Settings document to read
    pub settings_path: PathBuf,
    /// Source of the key
    pub key_source: KeySource,
    /// Destination of the password
    pub output: Output,
    /// Security question to answer instead of the site password
    pub question: Option<u32>,
    /// How long the password stays on the clipboard
    pub exposure: Duration,
}

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{}: {source}", .path.display())]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("{}: {source}", .path.display())]
    ReadKeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read passphrase: {0}")]
    Prompt(#[source] io::Error),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("no usable clipboard: {0}")]
    ClipboardBackend(#[source] io::Error),

    #[error("could not start timer: {0}")]
    Runtime(#[source] io::Error),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("could not write password: {0}")]
    Output(#[source] io::Error),
}

impl CliError {
    /// Failure category shown in the diagnostic line
    pub fn category(&self) -> &'static str {
        match self {
            CliError::ReadSettings { .. } => "file",
            CliError::Settings(_) => "settings",
            CliError::ReadKeyFile { .. } | CliError::Prompt(_) | CliError::Key(_) => "read key",
            CliError::Clipboard(e) if e.is_security_relevant() => "clipboard restore",
            CliError::ClipboardBackend(_) | CliError::Runtime(_) | CliError::Clipboard(_) => {
                "clipboard"
            }
            CliError::Output(_) => "output",
        }
    }
}
