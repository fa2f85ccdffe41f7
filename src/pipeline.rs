//! Encrypting documents to an identity and decrypting them again

use std::io::{Cursor, Read, Write};

use chrono::{SubsecRound, Utc};
use pgp::composed::{Deserializable, Message};
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::packet::{
    OnePassSignature, PublicKeyEncryptedSessionKey, SignatureConfig, SignatureType, Subpacket,
    SubpacketData, write_packet,
};
use pgp::types::{PublicKeyTrait, SecretKeyTrait};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{MonumentError, Result};
use crate::identity::Identity;
use crate::stream::{LITERAL_DATA_TAG, PartialBodyWriter, SEIPD_TAG, SealingWriter, TeeReader};

const ARMORED_MESSAGE_PREFIX: &[u8] = b"-----BEGIN PGP MESSAGE-----";

const CIPHER: SymmetricKeyAlgorithm = SymmetricKeyAlgorithm::AES256;
const DIGEST: HashAlgorithm = HashAlgorithm::SHA2_256;
const SEIPD_VERSION: u8 = 1;
const BINARY_MODE: u8 = b'b';

/// Encrypt `input` to `recipient`, signed by `signer`, writing binary OpenPGP to `output`
///
/// The message is a session key for `recipient`'s encryption subkey followed
/// by an AES-256 integrity protected packet holding a one-pass signed binary
/// literal named `file_name`. Body packets use partial lengths, so ciphertext
/// reaches `output` while `input` is still being read and memory use does
/// not grow with the document.
///
/// On error, whatever reached `output` is garbage and must be discarded by
/// the caller.
///
/// # Errors
/// Returns an error if reading, signing, encrypting or writing fails
pub fn encrypt<R: Read, W: Write>(
    recipient: &Identity,
    signer: &Identity,
    file_name: &str,
    input: R,
    mut output: W,
) -> Result<()> {
    let name_len = u8::try_from(file_name.len()).map_err(|_| {
        MonumentError::Document(format!("file name '{file_name}' is longer than 255 bytes"))
    })?;
    let created = u32::try_from(Utc::now().timestamp()).map_err(|_| {
        MonumentError::Document("current time does not fit an OpenPGP timestamp".to_string())
    })?;

    let encryption_key = recipient.encryption_key()?;
    let signing_key = signer.secret_key();
    let mut rng = rand::thread_rng();

    let session_key = CIPHER.new_session_key(&mut rng);
    let esk = PublicKeyEncryptedSessionKey::from_session_key_v3(
        &mut rng,
        &session_key,
        CIPHER,
        encryption_key,
    )
    .map_err(MonumentError::pgp("session key encryption"))?;
    write_packet(&mut output, &esk).map_err(MonumentError::pgp("message serialization"))?;

    let mut protected =
        PartialBodyWriter::new(&mut output, SEIPD_TAG).map_err(writing_message())?;
    protected.write_all(&[SEIPD_VERSION]).map_err(writing_message())?;
    let mut sealed =
        SealingWriter::new(protected, &session_key, &mut rng).map_err(writing_message())?;

    let one_pass = OnePassSignature::v3(
        SignatureType::Binary,
        DIGEST,
        signing_key.algorithm(),
        signing_key.key_id(),
    );
    write_packet(&mut sealed, &one_pass).map_err(MonumentError::pgp("message serialization"))?;

    let mut literal =
        PartialBodyWriter::new(sealed, LITERAL_DATA_TAG).map_err(writing_message())?;
    literal
        .write_all(&[BINARY_MODE, name_len])
        .and_then(|()| literal.write_all(file_name.as_bytes()))
        .and_then(|()| literal.write_all(&created.to_be_bytes()))
        .map_err(writing_message())?;

    // The document flows into the literal packet while the signature hashes it
    let mut tee = TeeReader::new(input, &mut literal);
    let signed = signature_config(signing_key).sign(signing_key, String::new, &mut tee);
    let (copied, read_error) = tee.into_parts();
    if let Some(err) = read_error {
        return Err(MonumentError::io("reading the document")(err));
    }
    let signature = signed.map_err(MonumentError::pgp("message signing"))?;
    debug!("encrypted {copied} bytes as '{file_name}'");

    let mut sealed = literal.finish().map_err(writing_message())?;
    write_packet(&mut sealed, &signature).map_err(MonumentError::pgp("message serialization"))?;
    sealed
        .finish()
        .and_then(PartialBodyWriter::finish)
        .map_err(writing_message())?;

    output
        .flush()
        .map_err(MonumentError::io("flushing the encrypted document"))
}

fn writing_message() -> impl FnOnce(std::io::Error) -> MonumentError {
    MonumentError::io("writing the encrypted document")
}

/// Binary document signature with the subpackets rpgp puts on its own messages
fn signature_config(key: &impl SecretKeyTrait) -> SignatureConfig {
    let mut config = SignatureConfig::v4(SignatureType::Binary, key.algorithm(), DIGEST);
    config.hashed_subpackets = vec![
        Subpacket::regular(SubpacketData::IssuerFingerprint(key.fingerprint())),
        Subpacket::regular(SubpacketData::SignatureCreationTime(
            Utc::now().trunc_subsecs(0),
        )),
    ];
    config.unhashed_subpackets = vec![Subpacket::regular(SubpacketData::Issuer(key.key_id()))];
    config
}

/// Decrypt a binary or armored OpenPGP message with `identity`
///
/// The signature is not checked against any trust chain.
///
/// # Errors
/// Returns an error if the message cannot be parsed, `identity` is not a
/// recipient, or the message holds no literal data
pub fn decrypt<R: Read>(identity: &Identity, mut input: R) -> Result<Zeroizing<Vec<u8>>> {
    let mut ciphertext = Vec::new();
    input
        .read_to_end(&mut ciphertext)
        .map_err(MonumentError::io("reading the encrypted document"))?;

    let message = if ciphertext.starts_with(ARMORED_MESSAGE_PREFIX) {
        Message::from_armor_single(Cursor::new(ciphertext.as_slice())).map(|(message, _)| message)
    } else {
        Message::from_bytes(Cursor::new(ciphertext.as_slice()))
    }
    .map_err(MonumentError::pgp("message parsing"))?;

    let (decrypted, key_ids) = message
        .decrypt(String::new, &[identity.secret_key()])
        .map_err(MonumentError::pgp("message decryption"))?;
    debug!("message decrypted with {} key(s)", key_ids.len());

    let content = decrypted
        .get_content()
        .map_err(MonumentError::pgp("message content extraction"))?
        .ok_or_else(|| MonumentError::Document("message carries no literal data".to_string()))?;

    Ok(Zeroizing::new(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Owner;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use std::sync::LazyLock;

    static ALICE: LazyLock<Identity> =
        LazyLock::new(|| Identity::create(&Owner::new("Alice", "alice@example.com")).unwrap());
    static BOB: LazyLock<Identity> =
        LazyLock::new(|| Identity::create(&Owner::new("Bob", "bob@example.com")).unwrap());

    fn round_trip(plaintext: &[u8]) -> Vec<u8> {
        let mut ciphertext = Vec::new();
        encrypt(&ALICE, &ALICE, "doc.txt", plaintext, &mut ciphertext).unwrap();
        decrypt(&ALICE, ciphertext.as_slice()).unwrap().to_vec()
    }

    #[test]
    fn test_round_trip_text() {
        assert_eq!(round_trip(b"the will is in the drawer"), b"the will is in the drawer");
    }

    #[test]
    fn test_round_trip_empty() {
        assert!(round_trip(b"").is_empty());
    }

    #[test]
    fn test_round_trip_larger_than_buffers() {
        let plaintext: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(round_trip(&plaintext), plaintext);
    }

    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Generated document that notes how much ciphertext exists when it runs out
    struct WatchedDocument {
        remaining: usize,
        output: Rc<RefCell<Vec<u8>>>,
        written_at_eof: Rc<Cell<Option<usize>>>,
    }

    impl Read for WatchedDocument {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                if self.written_at_eof.get().is_none() {
                    self.written_at_eof.set(Some(self.output.borrow().len()));
                }
                return Ok(0);
            }
            let len = buf.len().min(self.remaining);
            buf[..len].fill(b'z');
            self.remaining -= len;
            Ok(len)
        }
    }

    #[test]
    fn test_ciphertext_is_written_while_document_is_read() {
        const DOCUMENT_LEN: usize = 8 << 20;
        let output = Rc::new(RefCell::new(Vec::new()));
        let written_at_eof = Rc::new(Cell::new(None));
        let document = WatchedDocument {
            remaining: DOCUMENT_LEN,
            output: Rc::clone(&output),
            written_at_eof: Rc::clone(&written_at_eof),
        };

        encrypt(&ALICE, &ALICE, "big.bin", document, SharedOutput(Rc::clone(&output))).unwrap();

        let at_eof = written_at_eof.get().unwrap();
        assert!(
            at_eof > DOCUMENT_LEN / 2,
            "only {at_eof} ciphertext bytes existed when the document ended"
        );
        assert!(output.borrow().len() > DOCUMENT_LEN);
    }

    #[test]
    fn test_streamed_message_spanning_many_chunks_decrypts() {
        let plaintext: Vec<u8> = (0..100_003u32).map(|i| (i * 7 % 256) as u8).collect();
        let mut ciphertext = Vec::new();
        encrypt(&ALICE, &BOB, "doc.bin", plaintext.as_slice(), &mut ciphertext).unwrap();
        assert_eq!(decrypt(&ALICE, ciphertext.as_slice()).unwrap().as_slice(), plaintext);
    }

    #[test]
    fn test_failing_document_is_an_io_error() {
        struct Unplugged;
        impl Read for Unplugged {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device unplugged"))
            }
        }

        let err = encrypt(&ALICE, &ALICE, "doc", Unplugged, Vec::new()).unwrap_err();
        assert!(matches!(err, MonumentError::Io { .. }), "{err:?}");
    }

    #[test]
    fn test_overlong_file_name_is_rejected() {
        let name = "n".repeat(256);
        let err = encrypt(&ALICE, &ALICE, &name, &b"x"[..], Vec::new()).unwrap_err();
        assert!(matches!(err, MonumentError::Document(_)));
    }

    #[test]
    fn test_ciphertext_hides_plaintext() {
        let mut ciphertext = Vec::new();
        encrypt(&ALICE, &ALICE, "doc.txt", &b"needle in the haystack"[..], &mut ciphertext).unwrap();
        assert!(!ciphertext.windows(6).any(|window| window == b"needle"));
    }

    #[test]
    fn test_wrong_identity_cannot_decrypt() {
        let mut ciphertext = Vec::new();
        encrypt(&ALICE, &ALICE, "doc.txt", &b"for alice only"[..], &mut ciphertext).unwrap();

        let err = decrypt(&BOB, ciphertext.as_slice()).unwrap_err();
        assert!(matches!(err, MonumentError::Pgp { operation: "message decryption", .. }));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = decrypt(&ALICE, &b"not an openpgp message"[..]).unwrap_err();
        assert!(matches!(err, MonumentError::Pgp { .. }));
    }
}
