// cli/src/main.rs
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser, ValueHint};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

mod commands;
mod types;
mod utils;

use types::{KeySource, Output, RunConfig};

const EXIT_FAILURE: i32 = 1;

/// pwclip - Hash-based password manager
#[derive(Parser, Debug)]
#[command(name = "pwclip")]
#[command(version)]
#[command(about = "Hash-based password manager")]
#[command(
    long_about = "Derives a password from a secret key and a YAML settings file, then prints it or keeps it on the clipboard for a few seconds before restoring the previous contents"
)]
#[command(disable_version_flag = true)]
#[command(override_usage = "pwclip [-k <keyfile>] [-q <num>] [-p] <yamlfile>")]
struct Cli {
    /// Password settings in YAML format
    #[arg(value_name = "yamlfile", value_hint = ValueHint::FilePath)]
    settings: PathBuf,

    /// Read key from file, instead of prompting for a passphrase
    #[arg(short = 'k', value_name = "keyfile", value_hint = ValueHint::FilePath)]
    key_file: Option<PathBuf>,

    /// Print password to stdout, instead of copying it to the clipboard
    #[arg(short = 'p')]
    print: bool,

    /// Produce answer to the selected secret question
    #[arg(short = 'q', value_name = "num")]
    question: Option<u32>,

    /// Seconds the password stays on the clipboard
    #[arg(
        long,
        value_name = "SECONDS",
        env = "PWCLIP_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        RunConfig {
            settings_path: cli.settings,
            key_source: match cli.key_file {
                Some(path) => KeySource::File(path),
                None => KeySource::Prompt,
            },
            output: if cli.print {
                Output::Stdout
            } else {
                Output::Clipboard
            },
            question: cli.question,
            exposure: Duration::from_secs(cli.timeout),
        }
    }
}

/// Parse arguments, with `-v/--version` standing in for clap's `-V`
fn parse_args<I, T>(args: I) -> Result<RunConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Cli::command()
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version number and exit"),
        )
        .try_get_matches_from(args)?;

    Cli::from_arg_matches(&matches).map(RunConfig::from)
}

fn main() {
    utils::init_logging();

    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("pwclip: error (usage): {}", utils::usage_message(&e));
            eprintln!("{}", utils::SHORT_USAGE);
            process::exit(EXIT_FAILURE);
        }
    };

    if let Err(e) = commands::run(&config) {
        eprintln!("pwclip: error ({}): {}", e.category(), e);
        process::exit(EXIT_FAILURE);
    }
}
