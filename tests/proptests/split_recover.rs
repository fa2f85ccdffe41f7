//! Property tests for splitting secrets and recovering them from share subsets

use monument::ShareRejection;
use monument::domain::{ShareCount, SplitConfig, Threshold};
use monument::sharing::{Reconstruction, split, try_reconstruct};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// Non-empty secret up to a few kilobytes, the size of an armored private key
#[derive(Clone, Debug)]
struct Secret(Vec<u8>);

impl Arbitrary for Secret {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = (usize::arbitrary(g) % 4096) + 1;
        Secret((0..len).map(|_| u8::arbitrary(g)).collect())
    }
}

/// Valid threshold and share count pairs, with a shuffle seed for picking subsets
#[derive(Clone, Copy, Debug)]
struct ValidShamirParams {
    threshold: u8,
    num_shares: u8,
    seed: u64,
}

impl Arbitrary for ValidShamirParams {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_shares = (u8::arbitrary(g) % 19) + 2; // 2..=20
        let threshold = (u8::arbitrary(g) % (num_shares - 1)) + 2; // 2..=num_shares
        ValidShamirParams {
            threshold,
            num_shares,
            seed: u64::arbitrary(g),
        }
    }
}

impl ValidShamirParams {
    fn config(&self) -> SplitConfig {
        SplitConfig::new(
            Threshold::new(self.threshold).unwrap(),
            ShareCount::new(self.num_shares).unwrap(),
        )
        .unwrap()
    }

    /// Deterministic permutation of share positions
    fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..usize::from(self.num_shares)).collect();
        let mut state = self.seed | 1;
        for i in (1..order.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            order.swap(i, (state % (i as u64 + 1)) as usize);
        }
        order
    }

    fn pick(&self, shares: &[String], count: usize) -> Vec<String> {
        self.order()
            .into_iter()
            .take(count)
            .map(|position| shares[position].clone())
            .collect()
    }
}

fn split_lines(secret: &Secret, params: &ValidShamirParams) -> Vec<String> {
    split(&secret.0, params.config())
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[quickcheck]
fn prop_any_threshold_subset_recovers(secret: Secret, params: ValidShamirParams) -> bool {
    let shares = split_lines(&secret, &params);
    let subset = params.pick(&shares, usize::from(params.threshold));

    match try_reconstruct(&subset) {
        Reconstruction::Success(recovered) => *recovered == secret.0,
        _ => false,
    }
}

#[quickcheck]
fn prop_one_short_is_insufficient(secret: Secret, params: ValidShamirParams) -> bool {
    let shares = split_lines(&secret, &params);
    let subset = params.pick(&shares, usize::from(params.threshold) - 1);

    matches!(
        try_reconstruct(&subset),
        Reconstruction::Insufficient { collected, required: Some(required) }
            if collected == subset.len() && *required == params.threshold
    )
}

#[quickcheck]
fn prop_every_share_recovers(secret: Secret, params: ValidShamirParams) -> bool {
    let shares = split_lines(&secret, &params);
    let all = params.pick(&shares, shares.len());

    matches!(try_reconstruct(&all), Reconstruction::Success(recovered) if *recovered == secret.0)
}

#[quickcheck]
fn prop_corrupted_share_is_pinpointed(secret: Secret, params: ValidShamirParams) -> bool {
    let shares = split_lines(&secret, &params);
    let mut subset = params.pick(&shares, usize::from(params.threshold));

    let victim = (params.seed % subset.len() as u64) as usize;
    let mut corrupted = subset[victim].clone();
    let last = corrupted.pop().unwrap();
    corrupted.push(if last == 'A' { 'B' } else { 'A' });
    subset[victim] = corrupted;

    match try_reconstruct(&subset) {
        Reconstruction::InvalidShare { position, .. } => position == victim,
        _ => false,
    }
}

#[quickcheck]
fn prop_repeated_share_is_a_duplicate(secret: Secret, params: ValidShamirParams) -> bool {
    let shares = split_lines(&secret, &params);
    let mut subset = params.pick(&shares, usize::from(params.threshold) - 1);
    subset.push(subset[0].clone());

    matches!(
        try_reconstruct(&subset),
        Reconstruction::InvalidShare { position, reason: ShareRejection::Duplicate { .. } }
            if position == subset.len() - 1
    )
}

#[test]
fn test_shares_of_different_splits_do_not_mix() {
    let params = ValidShamirParams {
        threshold: 2,
        num_shares: 3,
        seed: 7,
    };
    let first = split_lines(&Secret(b"first secret".to_vec()), &params);
    let second = split_lines(&Secret(b"second secret, longer".to_vec()), &params);

    assert!(matches!(
        try_reconstruct(&[first[0].clone(), second[1].clone()]),
        Reconstruction::InvalidShare {
            position: 1,
            reason: ShareRejection::LengthMismatch { .. }
        }
    ));
}

#[test]
fn test_empty_secret_cannot_be_split() {
    let params = ValidShamirParams {
        threshold: 2,
        num_shares: 2,
        seed: 1,
    };
    assert!(split(b"", params.config()).is_err());
}
