//! Decode configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::SignatureVerifier;
use crate::codec::direction::{
    DirectionTable, DEFAULT_TABLE_EPSILON, DEFAULT_TABLE_RESOLUTION, DEFAULT_TWIST_SCALE,
};
use crate::codec::keyframe::DEFAULT_TICK_EPSILON;
use crate::codec::{ImplicitPolicy, IndexPasses};
use crate::util::{Error, Result};

/// File name of the per-user configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Tunables of one decode invocation.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    // Direction table
    pub direction_resolution: u32,
    pub direction_epsilon: f32,
    pub twist_scale: f32,

    // Keyframes
    pub tick_epsilon: f32,

    // Indices, used when a side table names no passes
    pub index_passes: IndexPasses,
    pub implicit_policy: ImplicitPolicy,

    // Signatures
    pub verify_signatures: bool,
    /// Big-endian modulus replacing the embedded one
    pub public_modulus: Option<Vec<u8>>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            direction_resolution: DEFAULT_TABLE_RESOLUTION,
            direction_epsilon: DEFAULT_TABLE_EPSILON,
            twist_scale: DEFAULT_TWIST_SCALE,
            tick_epsilon: DEFAULT_TICK_EPSILON,
            index_passes: IndexPasses::NONE,
            implicit_policy: ImplicitPolicy::Increment,
            verify_signatures: true,
            public_modulus: None,
        }
    }
}

impl DecodeConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "decode config loaded");
        Ok(config)
    }

    /// Per-user configuration path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("scenepak");
            p.push(CONFIG_FILE_NAME);
            p
        })
    }

    /// Load the per-user configuration, falling back to defaults.
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.direction_resolution == 0 {
            return Err(Error::metadata("direction_resolution must be positive"));
        }
        if self.tick_epsilon.is_nan() || self.tick_epsilon <= 0.0 {
            return Err(Error::metadata("tick_epsilon must be positive"));
        }
        if matches!(&self.public_modulus, Some(m) if m.iter().all(|&b| b == 0)) {
            return Err(Error::metadata("public_modulus must be non-zero"));
        }
        Ok(())
    }

    pub fn direction_table(&self) -> DirectionTable {
        DirectionTable::new(self.direction_resolution, self.direction_epsilon, self.twist_scale)
    }

    pub fn verifier(&self) -> SignatureVerifier {
        match &self.public_modulus {
            Some(modulus) => SignatureVerifier::new(modulus),
            None => SignatureVerifier::default(),
        }
    }
}
