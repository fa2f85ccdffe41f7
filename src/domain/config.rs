//! Threshold and share count handed to the secret sharing engine

use crate::domain::{ShareCount, Threshold};
use crate::error::{MonumentError, Result};

/// A threshold and share count that fit together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    threshold: Threshold,
    share_count: ShareCount,
}

impl SplitConfig {
    /// # Errors
    /// Returns [`MonumentError::InvalidParameter`] if fewer shares would be
    /// issued than are needed to recover
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monument::domain::{ShareCount, SplitConfig, Threshold};
    ///
    /// let config =
    ///     SplitConfig::new(Threshold::new(6).unwrap(), ShareCount::new(10).unwrap()).unwrap();
    /// assert_eq!(*config.threshold(), 6);
    /// assert_eq!(*config.share_count(), 10);
    ///
    /// // Five shares can never be gathered from three
    /// assert!(SplitConfig::new(Threshold::new(5).unwrap(), ShareCount::new(3).unwrap()).is_err());
    /// ```
    pub fn new(threshold: Threshold, share_count: ShareCount) -> Result<Self> {
        if *threshold > *share_count {
            return Err(MonumentError::InvalidParameter(format!(
                "Recovering needs {threshold} shares but only {share_count} would be issued"
            )));
        }
        Ok(Self {
            threshold,
            share_count,
        })
    }

    #[must_use]
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    #[must_use]
    pub fn share_count(&self) -> ShareCount {
        self.share_count
    }
}
