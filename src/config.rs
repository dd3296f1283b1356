//! Configuration for offsetidx
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for index persistence
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Cache Layout
    // -------------------------------------------------------------------------
    /// Root directory for cached indexes.
    /// Internal structure:
    ///   {cache_dir}/
    ///     └── {companion name}[-{origin}]/
    ///           └── {data version}/
    ///                 └── offsets.efo
    pub cache_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Save Configuration
    // -------------------------------------------------------------------------
    /// Extension appended to the target path while an image is being written
    pub tmp_extension: String,

    /// fsync the temporary file before renaming it into place
    pub sync_on_save: bool,

    // -------------------------------------------------------------------------
    // Load Configuration
    // -------------------------------------------------------------------------
    /// Verify the body CRC32 when loading (reads every mapped page once).
    ///
    /// When off, loading still checks the header, the file length, every
    /// select sample and the last value, but a flipped low bit or a flipped
    /// high bit between samples goes unnoticed and yields wrong offsets.
    pub verify_checksum: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./offsetidx_cache"),
            tmp_extension: "tmp".to_string(),
            sync_on_save: true,
            verify_checksum: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Options used when loading persisted images
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            verify_checksum: self.verify_checksum,
        }
    }
}

/// Knobs for turning a byte image back into a queryable index
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Recompute the body CRC32 and compare it with the header
    pub verify_checksum: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Config::default().load_options()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory for cached indexes
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = path.into();
        self
    }

    /// Set the extension used for in-progress writes
    pub fn tmp_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.tmp_extension = ext.into();
        self
    }

    /// Enable or disable fsync before rename
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.config.sync_on_save = sync;
        self
    }

    /// Enable or disable checksum verification on load
    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.config.verify_checksum = verify;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
