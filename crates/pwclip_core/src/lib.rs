//! # pwclip core - deterministic passwords, briefly on the clipboard
//!
//! This crate holds everything `pwclip` does besides argument handling:
//!
//! - Parsing a YAML settings document into a generic [`Node`] tree
//! - Validating that tree into a [`PasswordRequest`]
//! - Deriving key material from a passphrase (Argon2id) or key file (HKDF-SHA512)
//! - Rendering the password with an HMAC-SHA512 DRBG
//! - Placing the password on the system clipboard for a bounded window and
//!   restoring the previous contents exactly once
//!
//! ## Usage Example
//!
//! ```no_run
//! use pwclip_core::{resolve_settings, DrbgRenderer, KeyFileProvider, KeyProvider, Renderer};
//!
//! let settings = b"url: example.com\nusername: me@example.com\n";
//! let request = resolve_settings(settings, None).unwrap();
//!
//! let key = KeyFileProvider.derive_key(b"contents of a key file").unwrap();
//! let password = DrbgRenderer.render(&key, &request);
//! assert_eq!(password.chars().count(), 32);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Generic document tree and the YAML adapter that produces it
pub mod document;

/// Settings resolution: document tree to validated password request
pub mod settings;

/// Request record, defaults and error types shared by every module
pub mod types;

/// Key derivation from passphrases and key files
pub mod key;

/// Deterministic password rendering
pub mod render;

/// System clipboard access
pub mod clipboard;

/// Timed clipboard exposure with exactly-once restoration
pub mod delivery;

pub use clipboard::{Clipboard, CommandClipboard, FileClipboard, MemoryClipboard};
pub use delivery::{deliver, ClipboardSession, Exposure, Interrupts, SignalInterrupts};
pub use document::{parse_document, Node};
pub use key::{Argon2Params, DerivedKey, KeyFileProvider, KeyProvider, PassphraseKeyProvider};
pub use render::{DrbgRenderer, Renderer};
pub use settings::resolve_settings;
pub use types::{
    ClipboardError, KeyError, PasswordRequest, SettingsError, CHARSET_ALPHANUMERIC,
    DEFAULT_LENGTH, MAX_LENGTH,
};
