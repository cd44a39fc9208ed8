use std::fmt;
use std::io;

use thiserror::Error;

/// Default alphabet used when a settings document does not name a charset
pub const CHARSET_ALPHANUMERIC: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Password length used when a settings document does not give one
pub const DEFAULT_LENGTH: usize = 32;

/// Longest password a settings document may ask for
pub const MAX_LENGTH: usize = 4096;

/// Validated description of how to render one password.
///
/// Only [`crate::settings::resolve_settings`] builds these, so every instance
/// has a `length` between 1 and [`MAX_LENGTH`] and a `charset` of at least
/// two characters.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordRequest {
    pub(crate) url: String,
    pub(crate) username: String,
    pub(crate) prefix: String,
    pub(crate) charset: String,
    pub(crate) length: usize,
    pub(crate) extra: Option<String>,
}

impl PasswordRequest {
    /// Site the password belongs to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account name at the site
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Literal text placed in front of the rendered characters
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Alphabet the password is written in
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Password length in characters
    pub fn length(&self) -> usize {
        self.length
    }

    /// Security question selected at resolution time, if any
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }
}

// The question answer is as sensitive as the password it selects.
impl fmt::Debug for PasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordRequest")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("prefix", &self.prefix)
            .field("charset", &self.charset)
            .field("length", &self.length)
            .field("extra", &self.extra.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Errors produced while turning a settings document into a [`PasswordRequest`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The document could not be parsed, or its top level is not a mapping
    #[error("malformed settings document: {0}")]
    MalformedDocument(String),

    /// A recognised field holds a value of the wrong shape
    #[error("{}", type_mismatch_message(.field))]
    TypeMismatch {
        /// Name of the offending key
        field: String,
    },

    /// The selected security question has no `qN` key in the document
    #[error("question \"q{index}\" not in settings")]
    QuestionNotFound {
        /// Question number requested on the command line
        index: u32,
    },
}

fn type_mismatch_message(field: &str) -> String {
    match field {
        "length" => format!("length must be an integer from 1 to {}", MAX_LENGTH),
        "charset" => "charset must be a string of at least two characters".to_string(),
        other => format!("{} must be a string", other),
    }
}

impl SettingsError {
    pub(crate) fn mismatch(field: impl Into<String>) -> Self {
        SettingsError::TypeMismatch {
            field: field.into(),
        }
    }
}

/// Errors produced while deriving key material
#[derive(Error, Debug)]
pub enum KeyError {
    /// Passphrase or key file was empty
    #[error("key material is empty")]
    EmptySecret,

    /// The derivation function rejected its parameters or input
    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Errors produced by ephemeral clipboard delivery
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Snapshot of the current clipboard could not be taken; nothing was written
    #[error("could not read current clipboard contents: {0}")]
    ReadFailed(#[source] io::Error),

    /// Interrupt handlers could not be installed; nothing was written
    #[error("could not install interrupt handlers: {0}")]
    ListenerFailed(#[source] io::Error),

    /// Publishing the secret failed; the previous contents were left in place
    #[error("could not write to clipboard: {0}")]
    WriteFailed(#[source] io::Error),

    /// Writing the snapshot back failed; the secret may still be on the clipboard
    #[error("could not restore clipboard, the password may still be on it: {0}")]
    RestoreFailed(#[source] io::Error),
}

impl ClipboardError {
    /// True when the failure may have left the secret exposed
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, ClipboardError::RestoreFailed(_))
    }
}
