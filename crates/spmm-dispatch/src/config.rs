use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SpmmError};

/// Environment variable holding the toolkit version, e.g. `"11.2"`.
pub const TOOLKIT_VERSION_ENV: &str = "SPMM_TOOLKIT_VERSION";
/// Environment variable holding the scratch pool limit in bytes.
pub const SCRATCH_LIMIT_ENV: &str = "SPMM_SCRATCH_LIMIT";

/// Version of the sparse toolkit the engine targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolkitVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolkitVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        ToolkitVersion { major, minor }
    }
}

impl FromStr for ToolkitVersion {
    type Err = SpmmError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || SpmmError::Config(format!("invalid toolkit version '{}'", s));
        let mut parts = s.trim().splitn(2, '.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(bad)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| bad())?,
            None => 0,
        };
        Ok(ToolkitVersion { major, minor })
    }
}

impl fmt::Display for ToolkitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Algorithm selector passed to the primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpmmAlgorithm {
    Default,
    CsrAlg1,
    CsrAlg2,
}

/// What the targeted toolkit can do, derived from its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Descriptor-based SpMM API is available.
    pub generic_api: bool,
    /// Dense descriptors may be row-major.
    pub row_major_dense: bool,
    /// Sparse descriptors may carry 64-bit indices.
    pub wide_indices: bool,
}

impl Capabilities {
    /// Generic API from 10.1; row-major dense operands and 64-bit indices
    /// from 11.0.
    pub fn for_toolkit(version: ToolkitVersion) -> Self {
        let v11 = version >= ToolkitVersion::new(11, 0);
        Capabilities {
            generic_api: version >= ToolkitVersion::new(10, 1),
            row_major_dense: v11,
            wide_indices: v11,
        }
    }

    /// Every feature enabled.
    pub fn full() -> Self {
        Capabilities {
            generic_api: true,
            row_major_dense: true,
            wide_indices: true,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpmmConfig {
    pub toolkit: ToolkitVersion,
    /// Overrides the algorithm picked for the toolkit.
    pub algorithm: Option<SpmmAlgorithm>,
    /// Upper bound on bytes held by the scratch allocator.
    pub scratch_limit: Option<usize>,
}

impl Default for SpmmConfig {
    fn default() -> Self {
        SpmmConfig {
            toolkit: ToolkitVersion::new(11, 0),
            algorithm: None,
            scratch_limit: None,
        }
    }
}

impl SpmmConfig {
    pub fn for_toolkit(toolkit: ToolkitVersion) -> Self {
        SpmmConfig {
            toolkit,
            ..Default::default()
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Reads the following variables:
    /// - `SPMM_TOOLKIT_VERSION` -> toolkit (default 11.0)
    /// - `SPMM_SCRATCH_LIMIT` -> scratch_limit in bytes (default unlimited)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SpmmConfig::default();
        if let Some(v) = lookup(TOOLKIT_VERSION_ENV) {
            config.toolkit = v.parse()?;
        }
        if let Some(v) = lookup(SCRATCH_LIMIT_ENV) {
            let limit = v.trim().parse::<usize>().map_err(|_| {
                SpmmError::Config(format!("invalid {} value '{}'", SCRATCH_LIMIT_ENV, v))
            })?;
            config.scratch_limit = Some(limit);
        }
        Ok(config)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_toolkit(self.toolkit)
    }

    /// The configured algorithm, or the toolkit's default.
    pub fn algorithm(&self) -> SpmmAlgorithm {
        match self.algorithm {
            Some(alg) => alg,
            None if self.toolkit >= ToolkitVersion::new(11, 0) => SpmmAlgorithm::CsrAlg2,
            None => SpmmAlgorithm::Default,
        }
    }
}
