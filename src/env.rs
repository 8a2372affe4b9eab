//! Environment variable lookup.
//!
//! The namespace reads variables through the [`Environment`] trait instead of
//! calling into the process directly, so renders can be sandboxed and tests
//! never have to touch real process state.

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Read-only key → value lookup.
pub trait Environment: Send + Sync {
    /// Look up `key`. `None` if unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Shared environment handle.
pub type SharedEnvironment = Arc<dyn Environment>;

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

// =============================================================================
// ProcessEnv
// =============================================================================

/// The real process environment.
///
/// Values that are not valid UTF-8 are decoded lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        // Not a representable variable name.
        if key.is_empty() || key.contains(['=', '\0']) {
            return None;
        }
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }
}

// =============================================================================
// MapEnv
// =============================================================================

/// A fixed set of variables.
///
/// # Example
///
/// ```
/// use tpl_os::env::{Environment, MapEnv};
///
/// let env = MapEnv::new().with("HUGO_ENV", "production");
/// assert_eq!(env.var("HUGO_ENV").as_deref(), Some("production"));
/// assert_eq!(env.var("HOME"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: FxHashMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
