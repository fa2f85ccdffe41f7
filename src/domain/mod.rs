//! Validated parameters of a monument
//!
//! - [`PeopleConfig`]: how many people hold shares and how many must cooperate
//! - [`Partition`]: the share counts derived from it
//! - [`Threshold`], [`ShareCount`], [`ShareIndex`], [`SplitConfig`]: what the
//!   secret sharing engine is asked for

mod config;
mod partition;
mod people;
mod share_count;
mod share_index;
mod threshold;

pub use config::SplitConfig;
pub use partition::{Partition, compute_partition};
pub use people::PeopleConfig;
pub use share_count::ShareCount;
pub use share_index::ShareIndex;
pub use threshold::Threshold;
