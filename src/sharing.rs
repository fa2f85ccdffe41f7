//! Splitting a secret into threshold shares and putting it back together

use blahaj::{Share, Sharks};
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::{self, ShareText};
use crate::domain::{ShareIndex, SplitConfig, Threshold};
use crate::error::{MonumentError, RecoveryOutcome, Result, ShareRejection};

/// Split a secret into shares encoded as share lines
///
/// Any `threshold` of the returned shares rebuild `secret`; fewer reveal
/// nothing about it.
///
/// # Errors
/// Returns an error if the secret is empty or blahaj yields fewer shares than
/// requested
pub fn split(secret: &[u8], config: SplitConfig) -> Result<Vec<ShareText>> {
    if secret.is_empty() {
        return Err(MonumentError::Sharing("Cannot split an empty secret".to_string()));
    }

    let threshold = config.threshold();
    let num_shares = usize::from(*config.share_count());

    let sharks = Sharks(*threshold);
    let share_vec: Vec<Share> = sharks.dealer(secret).take(num_shares).collect();

    if share_vec.len() != num_shares {
        return Err(MonumentError::Sharing(format!(
            "Expected {num_shares} shares, dealer produced {}",
            share_vec.len()
        )));
    }

    share_vec
        .iter()
        .enumerate()
        .map(|(idx, share)| {
            let share_bytes = Zeroizing::new(Vec::from(share));
            let idx_u8 = u8::try_from(idx).map_err(|_| {
                MonumentError::Sharing(format!("Share index {idx} does not fit in u8"))
            })?;
            Ok(codec::create_share(
                &share_bytes,
                threshold,
                ShareIndex::new(idx_u8)?,
            ))
        })
        .collect()
}

/// Result of one reconstruction attempt
#[derive(Debug)]
pub enum Reconstruction {
    /// The candidates interpolate to this secret
    Success(Zeroizing<Vec<u8>>),
    /// Fewer distinct valid shares than the threshold
    Insufficient {
        collected: usize,
        required: Option<Threshold>,
    },
    /// The candidate at `position` cannot take part in reconstruction
    InvalidShare {
        position: usize,
        reason: ShareRejection,
    },
}

impl Reconstruction {
    /// Coarse verdict of this attempt
    #[must_use]
    pub fn outcome(&self) -> RecoveryOutcome {
        match self {
            Self::Success(_) => RecoveryOutcome::Success,
            Self::Insufficient { .. } => RecoveryOutcome::Insufficient,
            Self::InvalidShare { .. } => RecoveryOutcome::InvalidShare,
        }
    }
}

/// Attempt to rebuild the secret from candidate share lines
///
/// Pure: the same candidates always give the same verdict, so callers can
/// retry as their candidate set grows. The first candidate that fails to
/// decode, or disagrees with the ones before it, is reported by position.
#[must_use]
pub fn try_reconstruct<S: AsRef<str>>(candidates: &[S]) -> Reconstruction {
    let mut threshold: Option<Threshold> = None;
    let mut accepted: Vec<Share> = Vec::with_capacity(candidates.len());
    let mut accepted_bytes: Vec<Zeroizing<Vec<u8>>> = Vec::with_capacity(candidates.len());

    for (position, candidate) in candidates.iter().enumerate() {
        let parsed = match codec::parse_share(candidate.as_ref()) {
            Ok(parsed) => parsed,
            Err(reason) => return Reconstruction::InvalidShare { position, reason },
        };

        if let Err(reason) = check_consistency(threshold, &accepted_bytes, &parsed) {
            return Reconstruction::InvalidShare { position, reason };
        }

        let share = match Share::try_from(parsed.data.as_slice()) {
            Ok(share) => share,
            Err(e) => {
                return Reconstruction::InvalidShare {
                    position,
                    reason: ShareRejection::Malformed(e.to_string()),
                };
            }
        };

        threshold.get_or_insert(parsed.threshold);
        accepted.push(share);
        accepted_bytes.push(parsed.data);
    }

    let Some(threshold) = threshold else {
        return Reconstruction::Insufficient {
            collected: 0,
            required: None,
        };
    };

    if accepted.len() < usize::from(*threshold) {
        return Reconstruction::Insufficient {
            collected: accepted.len(),
            required: Some(threshold),
        };
    }

    match Sharks(*threshold).recover(&accepted) {
        Ok(secret) => Reconstruction::Success(Zeroizing::new(secret)),
        Err(e) => {
            debug!("blahaj refused to recover from {} shares: {e}", accepted.len());
            Reconstruction::Insufficient {
                collected: accepted.len(),
                required: Some(threshold),
            }
        }
    }
}

/// Checks a freshly parsed share against the shares accepted before it
fn check_consistency(
    threshold: Option<Threshold>,
    accepted: &[Zeroizing<Vec<u8>>],
    parsed: &codec::ParsedShare,
) -> std::result::Result<(), ShareRejection> {
    if let Some(expected) = threshold.filter(|expected| *expected != parsed.threshold) {
        return Err(ShareRejection::InconsistentThreshold {
            expected: *expected,
            found: *parsed.threshold,
        });
    }

    if let Some(first) = accepted.first().filter(|first| first.len() != parsed.data.len()) {
        return Err(ShareRejection::LengthMismatch {
            expected: first.len(),
            found: parsed.data.len(),
        });
    }

    // The first byte of a blahaj share is its x-coordinate
    if let Some(existing) = accepted.iter().find(|bytes| bytes[0] == parsed.data[0]) {
        let index = *parsed.index;
        return Err(if existing.as_slice() == parsed.data.as_slice() {
            ShareRejection::Duplicate { index }
        } else {
            ShareRejection::Conflicting { index }
        });
    }

    Ok(())
}
