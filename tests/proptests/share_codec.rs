//! Property tests for share line encoding

use monument::ShareRejection;
use monument::codec::{create_share, parse_share};
use monument::domain::{ShareIndex, Threshold};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// Share bytes shaped like blahaj output: x-coordinate plus at least one y byte
#[derive(Clone, Debug)]
struct ShareBytes(Vec<u8>);

impl Arbitrary for ShareBytes {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = (usize::arbitrary(g) % 256) + 2;
        ShareBytes((0..len).map(|_| u8::arbitrary(g)).collect())
    }
}

fn threshold(value: u8) -> Threshold {
    Threshold::new(value.max(2)).unwrap()
}

fn index(value: u8) -> ShareIndex {
    ShareIndex::new(value % (ShareIndex::MAX + 1)).unwrap()
}

#[quickcheck]
fn prop_share_line_decodes(bytes: ShareBytes, t: u8, i: u8) -> bool {
    let text = create_share(&bytes.0, threshold(t), index(i));
    let parsed = parse_share(text.as_str()).unwrap();

    parsed.threshold == threshold(t) && parsed.index == index(i) && *parsed.data == bytes.0
}

#[quickcheck]
fn prop_share_line_is_single_line(bytes: ShareBytes, t: u8, i: u8) -> bool {
    let text = create_share(&bytes.0, threshold(t), index(i));
    !text.as_str().contains('\n') && !text.as_str().contains(char::is_whitespace)
}

#[quickcheck]
fn prop_tampered_threshold_is_detected(bytes: ShareBytes, t: u8, i: u8) -> bool {
    let genuine = threshold(t);
    let forged = if *genuine == u8::MAX { 2 } else { *genuine + 1 };

    let text = create_share(&bytes.0, genuine, index(i));
    let tampered = text
        .as_str()
        .replacen(&format!(":{}:", *genuine), &format!(":{forged}:"), 1);

    matches!(
        parse_share(&tampered),
        Err(ShareRejection::ChecksumMismatch { .. })
    )
}

#[quickcheck]
fn prop_surrounding_whitespace_is_ignored(bytes: ShareBytes, t: u8, i: u8) -> bool {
    let text = create_share(&bytes.0, threshold(t), index(i));
    parse_share(&format!("  {}\t\n", text)).is_ok()
}

#[test]
fn test_foreign_lines_are_malformed() {
    for line in [
        "",
        "# Send each line to a different person",
        "monument",
        "monument:v2:2:0:AAAA",
        "monument:v1:1:0:AAAAAAAA",
        "monument:v1:2:255:AAAAAAAA",
        "monument:v1:2:0:!!!not base64!!!",
        "monument:v1:2:0:AAAA",
    ] {
        assert!(
            matches!(parse_share(line), Err(ShareRejection::Malformed(_))),
            "{line:?} should be malformed"
        );
    }
}
