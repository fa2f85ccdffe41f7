use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::PeopleConfig;

/// Validates a count of people
/// Zero people can neither hold shares nor decrypt anything
fn validate_people(s: &str) -> Result<u8, String> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("must be at least 1".to_string());
    }
    if value > PeopleConfig::MAX_TOTAL {
        return Err(format!("must be at most {}", PeopleConfig::MAX_TOTAL));
    }
    Ok(value)
}

#[derive(Parser)]
#[command(name = "monument")]
#[command(version)]
#[command(about = "Encrypt a document so that only a quorum of trusted people can read it")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new identity, encrypt a document to it and split its private key
    Encrypt {
        /// Owner name recorded in the key's user id
        #[arg(long)]
        name: String,

        /// Owner email recorded in the key's user id
        #[arg(long)]
        email: String,

        /// Document to encrypt ("-" for stdin)
        #[arg(short, long)]
        file: PathBuf,

        /// Number of people receiving a share
        #[arg(short, long, value_parser = validate_people)]
        people: u8,

        /// Number of people who, with the dead switch, can decrypt
        #[arg(short, long, value_parser = validate_people)]
        decryptable: u8,

        /// Directory receiving public/ and secret/
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
    /// Decrypt a document with a private key or with shares read from stdin
    Decrypt {
        /// Encrypted document ("-" for stdin, requires --private-key)
        #[arg(short, long)]
        file: PathBuf,

        /// Armored private key; shares are collected from stdin when omitted
        #[arg(long)]
        private_key: Option<PathBuf>,
    },
}
