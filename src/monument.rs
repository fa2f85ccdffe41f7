//! The monument aggregate: one identity, its share split, and the files handed
//! to the operator

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::codec::ShareText;
use crate::domain::{Partition, PeopleConfig};
use crate::error::{MonumentError, Result};
use crate::identity::{Identity, Owner};
use crate::pipeline;
use crate::provenance::{BuildInfo, Provenance};
use crate::sharing;

/// Directory under the output root holding files safe to publish
pub const PUBLIC_DIR: &str = "public";
/// Directory under the output root holding share bundles
pub const SECRET_DIR: &str = "secret";
/// Armored public key file name
pub const PUBLIC_KEY_FILE: &str = "pubkey.gpg";
/// Dead switch share bundle file name
pub const DEAD_SWITCH_FILE: &str = "shares_for_death_switch.txt";
/// People share bundle file name
pub const PEOPLE_FILE: &str = "shares_for_people.txt";

const DEAD_SWITCH_HEADER: &str =
    "# Put all the following lines into a \"dead man's switch\" service";
const PEOPLE_HEADER: &str = "# Send each line to a different person";

/// Paths of a complete artifact set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub encrypted_document: PathBuf,
    pub public_key: PathBuf,
    pub dead_switch_shares: PathBuf,
    pub people_shares: PathBuf,
}

/// A freshly generated identity with its private key split into shares
///
/// Write-once: built by [`Monument::create`], exported by
/// [`Monument::write_artifacts`], never persisted as a whole.
pub struct Monument {
    owner: Owner,
    partition: Partition,
    identity: Identity,
    shares: Vec<ShareText>,
    provenance: Provenance,
    created_at: DateTime<Local>,
}

impl Monument {
    /// Generates the identity, derives the partition and splits the private key
    ///
    /// # Errors
    /// Returns an error if the partition is invalid or key generation,
    /// serialization or splitting fails
    pub fn create(owner: Owner, people: PeopleConfig, build: &BuildInfo) -> Result<Self> {
        let created_at = Local::now();
        let partition = Partition::compute(people)?;

        info!(
            "Will generate {} shares, {} for distribution and {} for the dead switch",
            *partition.total_shares(),
            partition.people_shares(),
            partition.dead_switch_shares()
        );
        info!(
            "Decryption needs {} shares: the dead switch plus {} of {} people",
            *partition.minimal_shares(),
            people.minimal(),
            people.total()
        );

        let identity = Identity::create(&owner)?;
        let provenance = Provenance::new(build, created_at);
        let private_key = identity.serialize_private(&provenance.headers())?;
        let shares = sharing::split(private_key.as_bytes(), partition.split_config())?;

        Ok(Self {
            owner,
            partition,
            identity,
            shares,
            provenance,
            created_at,
        })
    }

    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// All shares, dead switch bucket first
    #[must_use]
    pub fn shares(&self) -> &[ShareText] {
        &self.shares
    }

    /// The first `dead_switch_shares` shares
    #[must_use]
    pub fn dead_switch_shares(&self) -> &[ShareText] {
        &self.shares[..usize::from(self.partition.dead_switch_shares())]
    }

    /// Every share after the dead switch bucket
    #[must_use]
    pub fn people_shares(&self) -> &[ShareText] {
        &self.shares[usize::from(self.partition.dead_switch_shares())..]
    }

    /// Armored public key with provenance headers
    ///
    /// # Errors
    /// Returns an error if the key cannot be serialized
    pub fn public_key(&self) -> Result<String> {
        self.identity.serialize_public(&self.provenance.headers())
    }

    /// Encrypts `document` and writes the full artifact set under `output_dir`
    ///
    /// Everything is first written to a staging directory inside `output_dir`.
    /// The staged `public/` and `secret/` directories are then renamed into
    /// place, the first one moved back if the second cannot follow. An
    /// `output_dir` whose `public/` or `secret/` already holds files is refused
    /// up front, so an old set is never mixed with a new one.
    ///
    /// # Errors
    /// Returns [`MonumentError::OutputOccupied`] if a target directory is not
    /// empty, or an error if encryption or any file operation fails
    pub fn write_artifacts<R: Read>(
        &self,
        document: R,
        document_name: &str,
        output_dir: &Path,
    ) -> Result<Artifacts> {
        check_output_dir(output_dir)?;

        create_private_dir(output_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".monument-staging-")
            .tempdir_in(output_dir)
            .map_err(MonumentError::io("creating the staging directory"))?;

        let layout = |root: &Path| {
            let public = root.join(PUBLIC_DIR);
            let secret = root.join(SECRET_DIR);
            Artifacts {
                encrypted_document: public.join(format!("{document_name}.gpg")),
                public_key: public.join(PUBLIC_KEY_FILE),
                dead_switch_shares: secret.join(DEAD_SWITCH_FILE),
                people_shares: secret.join(PEOPLE_FILE),
            }
        };
        let staged = layout(staging.path());

        create_private_dir(&staging.path().join(PUBLIC_DIR))?;
        create_private_dir(&staging.path().join(SECRET_DIR))?;

        self.write_encrypted_document(document, document_name, &staged.encrypted_document)?;
        write_file(&staged.public_key, self.public_key()?.as_bytes(), None)?;
        write_file(
            &staged.dead_switch_shares,
            share_bundle(DEAD_SWITCH_HEADER, self.dead_switch_shares()).as_bytes(),
            Some(0o600),
        )?;
        write_file(
            &staged.people_shares,
            share_bundle(PEOPLE_HEADER, self.people_shares()).as_bytes(),
            Some(0o600),
        )?;

        install(staging.path(), output_dir)?;

        info!("Artifacts written to {}", output_dir.display());
        Ok(layout(output_dir))
    }

    fn write_encrypted_document<R: Read>(
        &self,
        document: R,
        document_name: &str,
        path: &Path,
    ) -> Result<()> {
        let file = File::create(path)
            .map_err(MonumentError::io(format!("creating {}", path.display())))?;
        let mut writer = BufWriter::new(file);

        pipeline::encrypt(
            &self.identity,
            &self.identity,
            document_name,
            document,
            &mut writer,
        )?;

        writer
            .into_inner()
            .map_err(|e| MonumentError::io(format!("writing {}", path.display()))(e.into_error()))?
            .sync_all()
            .map_err(MonumentError::io(format!("syncing {}", path.display())))
    }
}

fn share_bundle(header: &str, shares: &[ShareText]) -> Zeroizing<String> {
    let mut bundle = Zeroizing::new(format!("{header}\n\n"));
    for share in shares {
        bundle.push_str(share.as_str());
        bundle.push('\n');
    }
    bundle
}

fn write_file(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let mut file = File::create(path)
        .map_err(MonumentError::io(format!("creating {}", path.display())))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(MonumentError::io(format!("writing {}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
                .map_err(MonumentError::io(format!("restricting {}", path.display())))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Checks that `output_dir` holds no artifact set yet
///
/// Missing or empty `public/` and `secret/` directories are fine.
///
/// # Errors
/// Returns [`MonumentError::OutputOccupied`] naming the first non-empty one
pub fn check_output_dir(output_dir: &Path) -> Result<()> {
    ensure_vacant(&output_dir.join(PUBLIC_DIR))?;
    ensure_vacant(&output_dir.join(SECRET_DIR))
}

/// Moves the staged `public/` and `secret/` under `output_dir` together
fn install(staging: &Path, output_dir: &Path) -> Result<()> {
    let moves = [PUBLIC_DIR, SECRET_DIR].map(|name| (staging.join(name), output_dir.join(name)));

    for (done, (from, to)) in moves.iter().enumerate() {
        let moved = ensure_vacant(to).and_then(|()| {
            remove_empty_dir(to)?;
            fs::rename(from, to)
                .map_err(MonumentError::io(format!("moving {} into place", to.display())))
        });

        if let Err(err) = moved {
            for (from, to) in moves[..done].iter().rev() {
                if let Err(undo) = fs::rename(to, from) {
                    warn!("Could not take {} back out: {undo}", to.display());
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Fails if `dir` exists and has any entry
fn ensure_vacant(dir: &Path) -> Result<()> {
    match fs::read_dir(dir) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                Err(MonumentError::OutputOccupied(dir.to_path_buf()))
            } else {
                Ok(())
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MonumentError::io(format!("inspecting {}", dir.display()))(err)),
    }
}

fn remove_empty_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MonumentError::io(format!("replacing {}", dir.display()))(err)),
    }
}

fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder
        .create(path)
        .map_err(MonumentError::io(format!("creating {}", path.display())))
}
