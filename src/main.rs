use std::io::{self, BufRead};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use monument::cli::{Cli, Commands};
use monument::commands::{
    check_decrypt_inputs, decrypt_document, encrypt_document, load_private_key,
    recover_private_key,
};
use monument::domain::PeopleConfig;
use monument::identity::{Identity, Owner};
use monument::provenance::BuildInfo;
use monument::recovery::SessionState;

/// Log to stderr, stdout carries decrypted plaintext
fn init_logging(verbose: bool) {
    let default = if verbose {
        "monument=debug"
    } else {
        "monument=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Shares from stdin, one per line
/// On a TTY input is hidden and an empty line ends it
fn share_lines() -> Box<dyn Iterator<Item = io::Result<String>>> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("Enter shares (one per line, empty line to finish):");
        Box::new(std::iter::from_fn(|| match rpassword::read_password() {
            Ok(line) if line.trim().is_empty() => None,
            result => Some(result),
        }))
    } else {
        Box::new(io::stdin().lock().lines())
    }
}

fn report(state: &SessionState) {
    match state {
        SessionState::Rejected { reason, .. } => {
            eprintln!("Share rejected ({reason}), continuing without it");
        }
        SessionState::Collecting => eprintln!("Share recorded, more are needed"),
        SessionState::Recovered(_) => eprintln!("Private key recovered"),
        SessionState::Exhausted => {}
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encrypt {
            name,
            email,
            file,
            people,
            decryptable,
            output,
        } => {
            let people = PeopleConfig::new(people, decryptable)?;
            let artifacts = encrypt_document(
                Owner::new(name, email),
                people,
                &file,
                &output,
                &BuildInfo::from_build_env(),
            )?;

            info!("Encrypted document: {}", artifacts.encrypted_document.display());
            info!("Public key: {}", artifacts.public_key.display());
            info!("Dead switch shares: {}", artifacts.dead_switch_shares.display());
            info!("People shares: {}", artifacts.people_shares.display());
        }
        Commands::Decrypt { file, private_key } => {
            check_decrypt_inputs(&file, private_key.as_deref())?;

            let identity: Identity = match private_key {
                Some(path) => load_private_key(&path)?,
                None => recover_private_key(share_lines(), report)?,
            };

            decrypt_document(&identity, &file, io::stdout().lock())?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
