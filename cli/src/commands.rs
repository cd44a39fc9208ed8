use std::fs;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

use pwclip_core::{
    clipboard, deliver, DerivedKey, DrbgRenderer, Exposure, KeyFileProvider, KeyProvider,
    PassphraseKeyProvider, Renderer, SignalInterrupts,
};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::types::{CliError, KeySource, Output, RunConfig};
use crate::utils;

/// Run the whole pipeline: settings, key, password, delivery
pub fn run(config: &RunConfig) -> Result<(), CliError> {
    let password = generate_password(config, &DrbgRenderer)?;

    match config.output {
        Output::Stdout => print_password(&password),
        Output::Clipboard => copy_to_clipboard(&password, config.exposure),
    }
}

/// Read and resolve the settings, obtain the key and render the password.
///
/// Settings are resolved before the key is requested, so a broken document
/// never leads to a passphrase prompt.
pub fn generate_password(
    config: &RunConfig,
    renderer: &dyn Renderer,
) -> Result<Zeroizing<String>, CliError> {
    let document = fs::read(&config.settings_path).map_err(|source| CliError::ReadSettings {
        path: config.settings_path.clone(),
        source,
    })?;

    let request = pwclip_core::resolve_settings(&document, config.question)?;
    debug!(path = %config.settings_path.display(), "settings loaded");

    let key = obtain_key(&config.key_source)?;
    Ok(renderer.render(&key, &request))
}

/// Derive the key from the configured source
pub fn obtain_key(source: &KeySource) -> Result<DerivedKey, CliError> {
    match source {
        KeySource::File(path) => {
            let contents = Zeroizing::new(fs::read(path).map_err(|source| {
                CliError::ReadKeyFile {
                    path: path.clone(),
                    source,
                }
            })?);
            Ok(KeyFileProvider.derive_key(&contents)?)
        }
        KeySource::Prompt => {
            let passphrase = utils::prompt_passphrase().map_err(CliError::Prompt)?;
            Ok(PassphraseKeyProvider::default().derive_key(passphrase.as_bytes())?)
        }
    }
}

fn print_password(password: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", password)
        .and_then(|_| stdout.flush())
        .map_err(CliError::Output)
}

/// Place the password on the clipboard for `exposure`.
///
/// Does not return when an interrupt ends the window early: the clipboard is
/// restored and the process exits.
fn copy_to_clipboard(password: &str, exposure: Duration) -> Result<(), CliError> {
    let clipboard = clipboard::detect().map_err(CliError::ClipboardBackend)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    eprintln!(
        "Password copied to clipboard for {} seconds.",
        exposure.as_secs()
    );

    let outcome = runtime.block_on(deliver(
        clipboard.as_ref(),
        password.as_bytes(),
        exposure,
        SignalInterrupts,
    ))?;

    if outcome == Exposure::Interrupted {
        info!("interrupted, clipboard restored");
        process::exit(0);
    }
    Ok(())
}
