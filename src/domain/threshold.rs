//! Number of shares a split needs back

use std::fmt;
use std::ops::Deref;

use crate::error::{MonumentError, Result};

/// How many shares rebuild the secret
///
/// Never below 2: a single share must not be enough on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(u8);

impl Threshold {
    /// Smallest threshold accepted
    pub const MIN: u8 = 2;

    /// # Errors
    /// Returns [`MonumentError::InvalidParameter`] below [`Self::MIN`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monument::domain::Threshold;
    ///
    /// // A monument for three people needs four shares back
    /// assert_eq!(*Threshold::new(4).unwrap(), 4);
    ///
    /// // One share alone would hand out the key
    /// assert!(Threshold::new(1).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(MonumentError::InvalidParameter(format!(
                "A split needs at least {} shares to recover, not {value}",
                Self::MIN
            )));
        }
        Ok(Self(value))
    }
}

impl Deref for Threshold {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &u8 {
        &self.0
    }
}

impl TryFrom<u8> for Threshold {
    type Error = MonumentError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
