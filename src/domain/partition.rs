//! Threshold partition between the dead switch and the people
//!
//! With `x` people, `y` of whom must cooperate, the calculator picks share
//! counts `a` (issued), `b` (threshold) and `z` (dead switch) such that
//!
//! - `x + z <= a`: every person and the dead switch get their shares
//! - `y + z >= b`: the dead switch plus `y` people can decrypt
//! - `x < b`, `y < b`, `z < b`: no bucket is self-sufficient
//! - `a >= b > 0`
//!
//! The general integer solution is
//! `a = 2n1 + n2 + 2n3 + n4 + n5 + 2`, `b = n1 + n2 + n3 + n4 + 2`,
//! `x = n1 + n2 + n3 + 1`, `y = n1 + n2 + 1`, `z = n1 + n3 + n4 + 1`
//! for non-negative `n1..n5`. Fixing `n2 = n4 = n5 = 0` gives
//! `n1 = y - 1`, `n3 = x - y` and the formulas used below.

use super::{PeopleConfig, ShareCount, SplitConfig, Threshold};
use crate::error::{MonumentError, Result};

/// Share counts derived from a [`PeopleConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    people: PeopleConfig,
    total_shares: ShareCount,
    minimal_shares: Threshold,
    dead_switch_shares: u8,
}

impl Partition {
    /// Derives the share counts for `people`
    ///
    /// # Errors
    /// Returns an error if a derived count falls outside the supported range
    /// or the result violates one of the partition inequalities
    ///
    /// ```rust
    /// use monument::domain::{Partition, PeopleConfig};
    ///
    /// let partition = Partition::compute(PeopleConfig::new(5, 3).unwrap()).unwrap();
    /// assert_eq!(*partition.total_shares(), 10);
    /// assert_eq!(*partition.minimal_shares(), 6);
    /// assert_eq!(partition.dead_switch_shares(), 5);
    /// ```
    pub fn compute(people: PeopleConfig) -> Result<Self> {
        let n1 = u16::from(people.minimal()) - 1;
        let n3 = u16::from(people.total()) - u16::from(people.minimal());

        let total = 2 * n1 + 2 * n3 + 2;
        let minimal = n1 + n3 + 2;
        let dead_switch = n1 + n3 + 1;

        let partition = Self {
            people,
            total_shares: ShareCount::new(narrow(total)?)?,
            minimal_shares: Threshold::new(narrow(minimal)?)?,
            dead_switch_shares: narrow(dead_switch)?,
        };
        partition.check_invariants()?;

        Ok(partition)
    }

    /// Re-checks every partition inequality
    ///
    /// # Errors
    /// Returns an error naming the first inequality that does not hold
    pub fn check_invariants(&self) -> Result<()> {
        let x = u16::from(self.people.total());
        let y = u16::from(self.people.minimal());
        let a = u16::from(*self.total_shares);
        let b = u16::from(*self.minimal_shares);
        let z = u16::from(self.dead_switch_shares);

        let checks = [
            (x + z <= a, "people + dead switch shares must not exceed total shares"),
            (y + z >= b, "dead switch + minimal people must reach the threshold"),
            (x < b, "all people alone must stay below the threshold"),
            (y < b, "minimal people alone must stay below the threshold"),
            (z < b, "the dead switch alone must stay below the threshold"),
            (a >= b && b > 0, "total shares must cover a positive threshold"),
        ];

        for (holds, description) in checks {
            if !holds {
                return Err(MonumentError::InvalidParameter(format!(
                    "Partition (a={a}, b={b}, z={z}) for x={x}, y={y} violates: {description}"
                )));
            }
        }

        Ok(())
    }

    /// The people configuration this partition was derived from
    #[must_use]
    pub fn people(&self) -> PeopleConfig {
        self.people
    }

    /// Number of shares issued (`a`)
    #[must_use]
    pub fn total_shares(&self) -> ShareCount {
        self.total_shares
    }

    /// Number of shares needed to reconstruct (`b`)
    #[must_use]
    pub fn minimal_shares(&self) -> Threshold {
        self.minimal_shares
    }

    /// Number of shares routed to the dead switch (`z`)
    #[must_use]
    pub fn dead_switch_shares(&self) -> u8 {
        self.dead_switch_shares
    }

    /// Number of shares routed to people (`a - z`)
    #[must_use]
    pub fn people_shares(&self) -> u8 {
        *self.total_shares - self.dead_switch_shares
    }

    /// Split configuration for the secret sharing engine
    #[must_use]
    pub fn split_config(&self) -> SplitConfig {
        // a >= b is part of check_invariants
        SplitConfig::new(self.minimal_shares, self.total_shares)
            .unwrap_or_else(|_| unreachable!("partition invariants guarantee b <= a"))
    }
}

/// Derives the partition straight from raw people counts
///
/// # Errors
/// Returns an error if the counts are not a valid [`PeopleConfig`]
pub fn compute_partition(total_people: u8, minimal_people: u8) -> Result<Partition> {
    Partition::compute(PeopleConfig::new(total_people, minimal_people)?)
}

fn narrow(value: u16) -> Result<u8> {
    u8::try_from(value).map_err(|_| {
        MonumentError::InvalidParameter(format!("Derived share count {value} exceeds 255"))
    })
}
