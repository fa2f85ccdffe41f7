//! Streaming OpenPGP framing
//!
//! Writers that emit an encrypted message while the document is still being
//! read: partial body length packets, the AES-256 CFB layer of a version 1
//! integrity protected packet, and a reader that tees the document into the
//! literal data packet while the signature hashes it.

use std::io::{self, Read, Write};

use aes::Aes256;
use cfb_mode::BufEncryptor;
use cfb_mode::cipher::KeyIvInit;
use rand::{CryptoRng, RngCore};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

pub(crate) const LITERAL_DATA_TAG: u8 = 11;
pub(crate) const SEIPD_TAG: u8 = 18;

/// Body chunks are `2^CHUNK_BITS` bytes, at least 512 for the first one
const CHUNK_BITS: u8 = 13;
const CHUNK_LEN: usize = 1 << CHUNK_BITS;

const AES_BLOCK_LEN: usize = 16;
const MDC_HEADER: [u8; 2] = [0xD3, 0x14];

/// Packet body written as partial length chunks, ended by a fixed length one
pub(crate) struct PartialBodyWriter<W: Write> {
    inner: W,
    buffer: Zeroizing<Vec<u8>>,
}

impl<W: Write> PartialBodyWriter<W> {
    /// Writes the new-format header for `tag`
    pub(crate) fn new(mut inner: W, tag: u8) -> io::Result<Self> {
        inner.write_all(&[0xC0 | tag])?;
        Ok(Self {
            inner,
            buffer: Zeroizing::new(Vec::with_capacity(CHUNK_LEN)),
        })
    }

    /// Writes what is buffered as the final chunk and hands back the inner writer
    pub(crate) fn finish(mut self) -> io::Result<W> {
        write_fixed_length(&mut self.inner, self.buffer.len())?;
        self.inner.write_all(&self.buffer)?;
        Ok(self.inner)
    }

    fn emit_chunk(&mut self) -> io::Result<()> {
        self.inner.write_all(&[0xE0 | CHUNK_BITS])?;
        self.inner.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for PartialBodyWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // A full chunk is only sent once more data follows, the last one must be fixed
        if self.buffer.len() == CHUNK_LEN && !data.is_empty() {
            self.emit_chunk()?;
        }
        let take = data.len().min(CHUNK_LEN - self.buffer.len());
        self.buffer.extend_from_slice(&data[..take]);
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn write_fixed_length(writer: &mut impl Write, len: usize) -> io::Result<()> {
    match len {
        0..=191 => writer.write_all(&[len as u8]),
        192..=8383 => {
            let len = len - 192;
            writer.write_all(&[(len >> 8) as u8 + 192, len as u8])
        }
        _ => {
            let len = u32::try_from(len).map_err(io::Error::other)?;
            writer.write_all(&[0xFF])?;
            writer.write_all(&len.to_be_bytes())
        }
    }
}

/// AES-256 CFB layer with a zero IV and no resync
///
/// Everything written is also hashed into the SHA-1 modification detection
/// code, which [`SealingWriter::finish`] appends.
pub(crate) struct SealingWriter<W: Write> {
    inner: W,
    cipher: BufEncryptor<Aes256>,
    mdc: Sha1,
    scratch: Zeroizing<Vec<u8>>,
}

impl<W: Write> SealingWriter<W> {
    /// Starts the ciphertext with a random block and its two quick check bytes
    pub(crate) fn new<R: RngCore + CryptoRng>(
        inner: W,
        session_key: &[u8],
        rng: &mut R,
    ) -> io::Result<Self> {
        let cipher = BufEncryptor::<Aes256>::new_from_slices(session_key, &[0u8; AES_BLOCK_LEN])
            .map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "session key is not an AES-256 key")
            })?;
        let mut writer = Self {
            inner,
            cipher,
            mdc: Sha1::new(),
            scratch: Zeroizing::new(Vec::new()),
        };

        let mut prefix = Zeroizing::new([0u8; AES_BLOCK_LEN + 2]);
        rng.fill_bytes(&mut prefix[..AES_BLOCK_LEN]);
        prefix[AES_BLOCK_LEN] = prefix[AES_BLOCK_LEN - 2];
        prefix[AES_BLOCK_LEN + 1] = prefix[AES_BLOCK_LEN - 1];
        writer.write_all(&*prefix)?;

        Ok(writer)
    }

    /// Appends the modification detection code and hands back the inner writer
    pub(crate) fn finish(mut self) -> io::Result<W> {
        self.mdc.update(MDC_HEADER);
        let digest = std::mem::take(&mut self.mdc).finalize();

        self.seal(&MDC_HEADER)?;
        self.seal(&digest)?;
        Ok(self.inner)
    }

    fn seal(&mut self, data: &[u8]) -> io::Result<()> {
        self.scratch.clear();
        self.scratch.extend_from_slice(data);
        self.cipher.encrypt(&mut self.scratch);
        self.inner.write_all(&self.scratch)
    }
}

impl<W: Write> Write for SealingWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.mdc.update(data);
        self.seal(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader that copies every byte it yields into `sink`
///
/// Failures of the wrapped reader are kept aside so the caller can report
/// them as document read errors rather than signing errors.
pub(crate) struct TeeReader<'a, R, W> {
    input: R,
    sink: &'a mut W,
    copied: u64,
    read_error: Option<io::Error>,
}

impl<'a, R: Read, W: Write> TeeReader<'a, R, W> {
    pub(crate) fn new(input: R, sink: &'a mut W) -> Self {
        Self {
            input,
            sink,
            copied: 0,
            read_error: None,
        }
    }

    /// Bytes copied so far and the read error that stopped copying, if any
    pub(crate) fn into_parts(self) -> (u64, Option<io::Error>) {
        (self.copied, self.read_error)
    }
}

impl<R: Read, W: Write> Read for TeeReader<'_, R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = match self.input.read(buf) {
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => return Err(err),
            Err(err) => {
                self.read_error = Some(err);
                return Err(io::Error::other("document could not be read"));
            }
        };
        self.sink.write_all(&buf[..read])?;
        self.copied += read as u64;
        Ok(read)
    }
}
