use std::io::{self, Write};

use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PWCLIP_LOG";

/// Short usage line printed with usage errors
pub const SHORT_USAGE: &str = "usage: pwclip [-k <keyfile>] [-q <num>] [-p] <yamlfile>";

/// Send `tracing` output to stderr, filtered by [`LOG_ENV`] (default `warn`)
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Prompt for the passphrase on stderr and read it without echo
pub fn prompt_passphrase() -> Result<Zeroizing<String>, io::Error> {
    eprint!("Passphrase: ");
    io::stderr().flush()?;

    let passphrase = rpassword::read_password()?;
    Ok(Zeroizing::new(passphrase))
}

/// Turn a clap error into the single line shown after `error (usage):`
pub fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches("error:").trim())
        .collect::<Vec<_>>()
        .join(" ")
}
