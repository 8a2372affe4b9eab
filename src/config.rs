//! Configuration for tpl-os.
//!
//! This module holds process-wide defaults for every [`Namespace`](crate::Namespace).
//! Use [`ConfigBuilder`] at application startup to change them.

use std::sync::OnceLock;

/// Default upper bound for `read_file`, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Runtime configuration for tpl-os.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Largest file `read_file` will return, in bytes.
    /// Files whose reported size is strictly greater are rejected.
    pub max_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    max_file_size: Option<u64>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size limit for `read_file`.
    ///
    /// Default: 1,000,000 bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use tpl_os::config::ConfigBuilder;
    ///
    /// ConfigBuilder::new()
    ///     .max_file_size(4 * 1024 * 1024)
    ///     .init();
    /// ```
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Build the configuration without installing it.
    pub fn build(self) -> Config {
        Config {
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Initialize tpl-os with default configuration.
///
/// This is equivalent to `ConfigBuilder::new().init()`.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
