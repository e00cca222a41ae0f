//! Shared configuration loader for the shaderpatch toolchain.
//!
//! `defaults/shaderpatch.default.toml` is embedded into every binary so that
//! docs and runtime behavior stay in sync. Applications layer user-specific
//! files on top of those defaults via [`Loader`] before deserializing into
//! [`ShaderPatchConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use shaderpatch::patch::parameters::ParseParameterError;
use shaderpatch::{AlphaTest, PatcherOptions};
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/shaderpatch.default.toml");

/// Top-level configuration consumed by shaderpatch applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ShaderPatchConfig {
    pub debug: DebugConfig,
    pub sodium: SodiumConfig,
    pub vanilla: VanillaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    pub log_transforms: bool,
}

/// Decode factors for the sodium vertex format.
#[derive(Debug, Clone, Deserialize)]
pub struct SodiumConfig {
    pub position_scale: f32,
    pub position_offset: f32,
    pub texture_scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VanillaConfig {
    pub alpha_test: String,
}

impl ShaderPatchConfig {
    /// Options for building a `TransformPatcher`.
    pub fn patcher_options(&self) -> PatcherOptions {
        PatcherOptions {
            log_transforms: self.debug.log_transforms,
        }
    }

    /// The configured default alpha test.
    pub fn alpha_test(&self) -> Result<AlphaTest, ParseParameterError> {
        self.vanilla.alpha_test.parse()
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ShaderPatchConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ShaderPatchConfig, ConfigError> {
    Loader::new().build()
}
