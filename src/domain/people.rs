//! People configuration supplied by the operator

use crate::error::{MonumentError, Result};

/// How many people hold shares, and how many of them must cooperate
///
/// Invariant: `total >= minimal >= 1` and `total <= MAX_TOTAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeopleConfig {
    total: u8,
    minimal: u8,
}

impl PeopleConfig {
    /// Largest supported number of people
    ///
    /// Every person is matched by a dead-switch share, so the issued share
    /// count is twice this and must stay within [`super::ShareCount::MAX`].
    pub const MAX_TOTAL: u8 = 127;

    /// Creates a validated people configuration
    ///
    /// # Errors
    /// Returns an error if `minimal` is zero, exceeds `total`, or `total`
    /// exceeds [`Self::MAX_TOTAL`]
    ///
    /// ```rust
    /// use monument::domain::PeopleConfig;
    ///
    /// let people = PeopleConfig::new(5, 3).unwrap();
    /// assert_eq!(people.total(), 5);
    /// assert_eq!(people.minimal(), 3);
    ///
    /// assert!(PeopleConfig::new(3, 5).is_err());
    /// assert!(PeopleConfig::new(3, 0).is_err());
    /// ```
    pub fn new(total: u8, minimal: u8) -> Result<Self> {
        if minimal == 0 {
            return Err(MonumentError::InvalidParameter(
                "At least one person must be required to decrypt".to_string(),
            ));
        }
        if total < minimal {
            return Err(MonumentError::InvalidParameter(format!(
                "Decryptable people ({minimal}) cannot exceed total people ({total})"
            )));
        }
        if total > Self::MAX_TOTAL {
            return Err(MonumentError::InvalidParameter(format!(
                "At most {} people are supported (got {total})",
                Self::MAX_TOTAL
            )));
        }
        Ok(Self { total, minimal })
    }

    /// Total number of people receiving a share
    #[must_use]
    pub fn total(&self) -> u8 {
        self.total
    }

    /// Smallest group of people allowed to decrypt together with the dead switch
    #[must_use]
    pub fn minimal(&self) -> u8 {
        self.minimal
    }
}
