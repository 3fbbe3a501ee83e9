//! Configuration management for the GLX backend
//!
//! Settings are loaded from a TOML file with one table per concern. Every
//! section and field has a default, so an empty file is a valid config.
//!
//! ```toml
//! [glx]
//! no_stencil = false
//! swap_method = "buffer-age"
//! max_buffer_age = 5
//! debug_context = false
//!
//! [general]
//! debug = false
//! use_overlay = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted `max_buffer_age`
pub const MAX_BUFFER_AGE_LIMIT: u32 = 16;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BackendConfig {
    /// GLX backend settings
    #[serde(default)]
    pub glx: GlxConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

/// How the driver treats the back buffer after a swap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SwapMethod {
    /// Nothing is assumed; every frame is a full repaint
    #[default]
    Undefined,
    /// Back buffer is copied to the front
    Copy,
    /// Back and front buffers are exchanged
    Exchange,
    /// Ask the driver for the back buffer's age (`GLX_EXT_buffer_age`)
    BufferAge,
}

/// GLX backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlxConfig {
    /// Don't require or use a stencil buffer
    pub no_stencil: bool,

    /// Swap method used to decide whether buffer age can be trusted
    pub swap_method: SwapMethod,

    /// How many frames of damage history callers keep for buffer-age repaint
    pub max_buffer_age: u32,

    /// Install a GL debug message callback after context creation
    pub debug_context: bool,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable debug logging
    pub debug: bool,

    /// Render into the Composite overlay window instead of the root window
    pub use_overlay: bool,
}

impl Default for GlxConfig {
    fn default() -> Self {
        Self {
            no_stencil: false,
            swap_method: SwapMethod::Undefined,
            max_buffer_age: 5,
            debug_context: false,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            use_overlay: true,
        }
    }
}

impl GeneralConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

impl BackendConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: BackendConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.glx.max_buffer_age == 0 || self.glx.max_buffer_age > MAX_BUFFER_AGE_LIMIT {
            anyhow::bail!(
                "Invalid max_buffer_age {}: must be between 1 and {}",
                self.glx.max_buffer_age,
                MAX_BUFFER_AGE_LIMIT
            );
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
