//! Number of shares a split hands out
//!
//! blahaj gives shares the GF(256) x-coordinates `1..=255`. Leaving one
//! coordinate spare keeps every issued share's zero-based index below 254.

use std::fmt;
use std::ops::Deref;

use crate::error::{MonumentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShareCount(u8);

impl ShareCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 254;

    /// # Errors
    /// Returns [`MonumentError::InvalidParameter`] outside `MIN..=MAX`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monument::domain::ShareCount;
    ///
    /// // 127 people get 254 shares, the most a split can issue
    /// assert_eq!(*ShareCount::new(254).unwrap(), 254);
    ///
    /// assert!(ShareCount::new(0).is_err());
    /// assert!(ShareCount::new(255).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(MonumentError::InvalidParameter(format!(
                "Between {} and {} shares can be issued, not {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }
}

impl Deref for ShareCount {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &u8 {
        &self.0
    }
}

impl TryFrom<u8> for ShareCount {
    type Error = MonumentError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for ShareCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
