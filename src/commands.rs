use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use zeroize::Zeroizing;

use crate::domain::PeopleConfig;
use crate::identity::{Identity, Owner, PRIVATE_KEY_MARKER};
use crate::monument::{Artifacts, Monument, check_output_dir};
use crate::pipeline;
use crate::provenance::BuildInfo;
use crate::recovery::{self, RecoverySession, SessionState};

/// Path value meaning "standard input"
pub const STDIN_PATH: &str = "-";

/// Name of the encrypted document when it was read from stdin
const STDIN_DOCUMENT_NAME: &str = "stdin";

/// Whether `path` stands for standard input
#[must_use]
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

/// Base name used for the encrypted copy of `file`
///
/// # Errors
/// Returns an error if `file` has no final path component
pub fn document_name(file: &Path) -> Result<String> {
    if is_stdin(file) {
        return Ok(STDIN_DOCUMENT_NAME.to_string());
    }
    let name = file
        .file_name()
        .with_context(|| format!("'{}' does not name a file", file.display()))?;
    Ok(name.to_string_lossy().into_owned())
}

fn open_input(file: &Path) -> Result<Box<dyn Read>> {
    if is_stdin(file) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let handle =
        File::open(file).with_context(|| format!("Failed to open '{}'", file.display()))?;
    Ok(Box::new(BufReader::new(handle)))
}

/// Create a monument for `owner`, encrypt `file` to it and write every artifact
///
/// # Errors
/// Returns an error if the document cannot be read, or generation or writing
/// fails
pub fn encrypt_document(
    owner: Owner,
    people: PeopleConfig,
    file: &Path,
    output_dir: &Path,
    build: &BuildInfo,
) -> Result<Artifacts> {
    let name = document_name(file)?;
    check_output_dir(output_dir)
        .with_context(|| format!("Cannot write artifacts to '{}'", output_dir.display()))?;
    let document = open_input(file)?;

    let monument =
        Monument::create(owner, people, build).context("Failed to create the monument")?;

    monument
        .write_artifacts(document, &name, output_dir)
        .with_context(|| format!("Failed to write artifacts to '{}'", output_dir.display()))
}

/// Load the identity from an armored private key file
///
/// # Errors
/// Returns an error if the file cannot be read or is not a private key
pub fn load_private_key(path: &Path) -> Result<Identity> {
    let armored = Zeroizing::new(
        std::fs::read(path)
            .with_context(|| format!("Failed to read private key '{}'", path.display()))?,
    );
    Identity::from_armored_secret(&armored)
        .with_context(|| format!("'{}' is not a usable private key", path.display()))
}

/// Rebuild the identity from shares, one per line
///
/// `on_event` is told about every state change so the operator can be
/// informed of rejected shares.
///
/// # Errors
/// Returns an error if input ends before enough valid shares arrive, or the
/// rebuilt key cannot be loaded
pub fn recover_private_key<I, E>(lines: I, on_event: E) -> Result<Identity>
where
    I: IntoIterator<Item = io::Result<String>>,
    E: FnMut(&SessionState),
{
    let session = RecoverySession::new(|bytes: &[u8]| contains_marker(bytes));
    let armored = recovery::run(session, lines, on_event).context("Failed to collect shares")?;

    Identity::from_armored_secret(&armored).context("Recovered shares do not form a private key")
}

fn contains_marker(bytes: &[u8]) -> bool {
    let marker = PRIVATE_KEY_MARKER.as_bytes();
    bytes.windows(marker.len()).any(|window| window == marker)
}

/// Decrypt `file` with `identity`, writing the identity and plaintext to `out`
///
/// # Errors
/// Returns an error if the document cannot be read or decrypted
pub fn decrypt_document<W: Write>(identity: &Identity, file: &Path, mut out: W) -> Result<()> {
    let encrypted = open_input(file)?;

    let plaintext = pipeline::decrypt(identity, encrypted)
        .with_context(|| format!("Failed to decrypt '{}'", file.display()))?;

    for user_id in identity.user_ids() {
        writeln!(out, "Decrypted identity: {user_id}")?;
    }
    writeln!(out, "Contents: ")?;
    out.write_all(&plaintext)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Refuse to read both the document and the shares from stdin
///
/// # Errors
/// Returns an error if `file` is stdin and no private key file was given
pub fn check_decrypt_inputs(file: &Path, private_key: Option<&Path>) -> Result<()> {
    if is_stdin(file) && private_key.is_none() {
        bail!("Cannot read the document from stdin while collecting shares; pass --private-key");
    }
    Ok(())
}
