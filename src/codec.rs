//! Text encoding for threshold shares
//!
//! Every share is a single line that an operator can copy, print, or paste
//! back during recovery:
//!
//! ```text
//! monument:v1:<threshold>:<index>:<base64 payload>
//! ```
//!
//! The payload is the raw blahaj share followed by a big-endian CRC32 over
//! `threshold || index || share`. Because the threshold travels with each
//! share, recovery can tell "not enough shares yet" apart from "this share is
//! damaged" without trying to interpolate.
//!
//! # Examples
//!
//! ```rust
//! use monument::codec::{create_share, parse_share};
//! use monument::domain::{ShareIndex, Threshold};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let share_data = vec![0x01, 0xDE, 0xAD, 0xBE, 0xEF];
//! let threshold = Threshold::new(3)?;
//! let index = ShareIndex::new(0)?;
//!
//! let text = create_share(&share_data, threshold, index);
//! assert!(text.as_str().starts_with("monument:v1:3:0:"));
//!
//! let parsed = parse_share(text.as_str())?;
//! assert_eq!(parsed.threshold, threshold);
//! assert_eq!(parsed.index, index);
//! assert_eq!(*parsed.data, share_data);
//! # Ok(())
//! # }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crc::{CRC_32_ISO_HDLC, Crc};
use zeroize::Zeroizing;

use crate::domain::{ShareIndex, Threshold};
use crate::error::ShareRejection;

/// CRC32 algorithm for share integrity checking
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Leading tag of every share line
pub const SHARE_PREFIX: &str = "monument";

/// Current share format version
pub const FORMAT_VERSION: &str = "v1";

const CHECKSUM_LEN: usize = 4;

/// blahaj shares carry one x-coordinate byte plus at least one y byte
const MIN_SHARE_LEN: usize = 2;

/// A share line, wiped from memory on drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareText(Zeroizing<String>);

impl ShareText {
    /// Gets the share line as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShareText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &*self.0)
    }
}

/// Components of a decoded share line
#[derive(Debug)]
pub struct ParsedShare {
    pub threshold: Threshold,
    pub index: ShareIndex,
    pub data: Zeroizing<Vec<u8>>,
}

/// Encodes raw share bytes as a share line
#[must_use]
pub fn create_share(share_data: &[u8], threshold: Threshold, index: ShareIndex) -> ShareText {
    let mut payload = Zeroizing::new(Vec::with_capacity(share_data.len() + CHECKSUM_LEN));
    payload.extend_from_slice(share_data);
    payload.extend_from_slice(&checksum(threshold, index, share_data).to_be_bytes());

    ShareText(Zeroizing::new(format!(
        "{SHARE_PREFIX}:{FORMAT_VERSION}:{}:{}:{}",
        *threshold,
        *index,
        STANDARD.encode(payload.as_slice())
    )))
}

/// Decodes and verifies a share line
///
/// # Errors
/// Returns a [`ShareRejection`] if the line is not a share, a field is out of
/// range, the payload is not valid base64, or the checksum does not match
pub fn parse_share(line: &str) -> Result<ParsedShare, ShareRejection> {
    let mut fields = line.trim().splitn(5, ':');

    let prefix = fields.next().unwrap_or_default();
    if prefix != SHARE_PREFIX {
        return Err(ShareRejection::Malformed(format!(
            "expected prefix '{SHARE_PREFIX}', got '{prefix}'"
        )));
    }

    let version = next_field(&mut fields, "version")?;
    if version != FORMAT_VERSION {
        return Err(ShareRejection::Malformed(format!(
            "unsupported format version '{version}'"
        )));
    }

    let threshold = parse_u8(next_field(&mut fields, "threshold")?, "threshold")?;
    let threshold =
        Threshold::new(threshold).map_err(|e| ShareRejection::Malformed(e.to_string()))?;

    let index = parse_u8(next_field(&mut fields, "index")?, "index")?;
    let index = ShareIndex::new(index).map_err(|e| ShareRejection::Malformed(e.to_string()))?;

    let payload = Zeroizing::new(
        STANDARD
            .decode(next_field(&mut fields, "payload")?)
            .map_err(|e| ShareRejection::Malformed(format!("payload is not base64: {e}")))?,
    );

    if payload.len() < MIN_SHARE_LEN + CHECKSUM_LEN {
        return Err(ShareRejection::Malformed(format!(
            "payload too short: {} bytes",
            payload.len()
        )));
    }

    let (share_data, checksum_bytes) = payload.split_at(payload.len() - CHECKSUM_LEN);
    let actual = u32::from_be_bytes([
        checksum_bytes[0],
        checksum_bytes[1],
        checksum_bytes[2],
        checksum_bytes[3],
    ]);
    let expected = checksum(threshold, index, share_data);

    if expected != actual {
        return Err(ShareRejection::ChecksumMismatch { expected, actual });
    }

    Ok(ParsedShare {
        threshold,
        index,
        data: Zeroizing::new(share_data.to_vec()),
    })
}

fn checksum(threshold: Threshold, index: ShareIndex, share_data: &[u8]) -> u32 {
    let mut digest = CRC32.digest();
    digest.update(&[*threshold, *index]);
    digest.update(share_data);
    digest.finalize()
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &str,
) -> Result<&'a str, ShareRejection> {
    fields
        .next()
        .filter(|field| !field.is_empty())
        .ok_or_else(|| ShareRejection::Malformed(format!("missing {name} field")))
}

fn parse_u8(field: &str, name: &str) -> Result<u8, ShareRejection> {
    field
        .parse()
        .map_err(|_| ShareRejection::Malformed(format!("{name} '{field}' is not a number")))
}
