//! Issue position of a share

use std::fmt;
use std::ops::Deref;

use crate::domain::ShareCount;
use crate::error::{MonumentError, Result};

/// Zero-based position of a share in its split, printed in every share line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareIndex(u8);

impl ShareIndex {
    /// Index of the last share of the largest split
    pub const MAX: u8 = ShareCount::MAX - 1;

    /// # Errors
    /// Returns [`MonumentError::InvalidParameter`] above [`Self::MAX`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monument::domain::ShareIndex;
    ///
    /// assert_eq!(*ShareIndex::new(0).unwrap(), 0);
    /// assert_eq!(*ShareIndex::new(ShareIndex::MAX).unwrap(), 253);
    ///
    /// // No split issues a 255th share
    /// assert!(ShareIndex::new(254).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(MonumentError::InvalidParameter(format!(
                "Share index {value} is past the last issuable share ({})",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl Deref for ShareIndex {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &u8 {
        &self.0
    }
}

impl TryFrom<u8> for ShareIndex {
    type Error = MonumentError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for ShareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
