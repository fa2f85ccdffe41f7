// Library behind the `monument` binary
// Exposed so integration tests can drive the workflows directly

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod commands;
pub mod domain;
pub mod error;
pub mod identity;
pub mod monument;
pub mod pipeline;
pub mod provenance;
pub mod recovery;
pub mod sharing;
mod stream;

pub use error::{MonumentError, RecoveryOutcome, Result, ShareRejection};
