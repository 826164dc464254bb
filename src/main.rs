use anyhow::Result;
use clap::Parser;
mod auth;
mod shell;
use datavault::{AdminSecret, Config, DEFAULT_MAX_ATTEMPTS, DataVault};
use shell::Shell;
use std::io::{self, IsTerminal};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datavault")]
#[command(
    version,
    about = "Encrypt text under a passkey and get it back later. Everything is forgotten on exit."
)]
struct Cli {
    /// Admin secret that lifts lockouts
    #[arg(long, env = "DATAVAULT_ADMIN_SECRET", hide_env_values = true)]
    admin_secret: Option<String>,

    /// Failed passkey attempts allowed before a label locks
    #[arg(long, env = "DATAVAULT_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Reject stored ciphertexts older than this
    #[arg(long, env = "DATAVAULT_TOKEN_TTL", value_name = "SECONDS")]
    token_ttl: Option<u64>,

    /// Count failed decryptions with a matching passkey as failed attempts
    #[arg(long, env = "DATAVAULT_COUNT_DECRYPT_FAILURES")]
    count_decrypt_failures: bool,

    /// Print one JSON object per reply
    #[arg(long)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = Config::new(
        args.max_attempts,
        args.token_ttl.map(Duration::from_secs),
        args.count_decrypt_failures,
    )?;

    let admin = match args.admin_secret {
        Some(secret) if !secret.is_empty() => AdminSecret::new(secret),
        _ => {
            warn!("no admin secret configured, using the built-in default");
            AdminSecret::default()
        }
    };

    let vault = DataVault::with_authority(config, admin);
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();

    let mut shell = Shell::new(vault, stdin.lock(), io::stdout().lock(), interactive, args.json);
    shell.run()
}
