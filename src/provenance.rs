//! Build metadata and the provenance headers stamped on exported keys

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

/// Project homepage shown in version strings
pub const HOMEPAGE: &str = "https://github.com/Jamesits/monument";

/// Immutable description of the running build
///
/// Constructed once at startup and passed to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub git_status: String,
    pub compiled_at: String,
    pub compiled_on: String,
}

impl BuildInfo {
    /// Build metadata baked in at compile time
    ///
    /// `MONUMENT_BUILD_COMMIT`, `MONUMENT_BUILD_GIT_STATUS`,
    /// `MONUMENT_BUILD_TIME` and `MONUMENT_BUILD_HOST` are read from the
    /// compiler's environment when set.
    #[must_use]
    pub fn from_build_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("MONUMENT_BUILD_COMMIT")
                .unwrap_or("UNKNOWN")
                .to_string(),
            git_status: option_env!("MONUMENT_BUILD_GIT_STATUS")
                .unwrap_or("dirty")
                .to_string(),
            compiled_at: option_env!("MONUMENT_BUILD_TIME")
                .unwrap_or("UNKNOWN TIME")
                .to_string(),
            compiled_on: option_env!("MONUMENT_BUILD_HOST")
                .unwrap_or("localhost")
                .to_string(),
        }
    }

    /// Full version line used for the `CreatedBy` header
    #[must_use]
    pub fn full_version(&self) -> String {
        format!(
            "monument {} ({HOMEPAGE}, compiled on {} for commit {} ({}) at {})",
            self.version, self.compiled_on, self.commit, self.git_status, self.compiled_at
        )
    }
}

/// Armor header map as expected by rpgp
pub type ArmorHeaders = BTreeMap<String, Vec<String>>;

/// Who made an exported key, and when
#[derive(Debug, Clone)]
pub struct Provenance {
    created_by: String,
    created_at: DateTime<Local>,
}

impl Provenance {
    #[must_use]
    pub fn new(build: &BuildInfo, created_at: DateTime<Local>) -> Self {
        Self {
            created_by: build.full_version(),
            created_at,
        }
    }

    /// `CreatedAt` value: human readable time, then nanoseconds since the epoch
    #[must_use]
    pub fn created_at_header(&self) -> String {
        let nanos = self.created_at.timestamp_nanos_opt().unwrap_or_default();
        format!("{} ({nanos})", self.created_at)
    }

    /// Headers for armored key blocks
    #[must_use]
    pub fn headers(&self) -> ArmorHeaders {
        let mut headers = ArmorHeaders::new();
        headers.insert("CreatedBy".to_string(), vec![self.created_by.clone()]);
        headers.insert("CreatedAt".to_string(), vec![self.created_at_header()]);
        headers
    }
}
