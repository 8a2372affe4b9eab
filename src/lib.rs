//! # tpl-os
//!
//! Read-only file and environment access for template engines.
//!
//! Templates often need to pull in a data file or check for a partial by
//! path. Such paths may live in the project's working directory or in a
//! separate content root. This crate resolves them against both:
//!
//! - **Content root** shadows the working directory, path by path
//! - **Working directory** is the fallback, and the only root `read_dir` lists
//! - **Read-only**: every mutating call is rejected
//! - **Size guard**: `read_file` refuses files over 1 MB by default
//!
//! ## Quick Start
//!
//! ```ignore
//! use tpl_os::Namespace;
//! use serde_json::json;
//!
//! let ns = Namespace::builder()
//!     .with_working_dir_path("/srv/site")
//!     .with_content_path("/srv/site/content")
//!     .build();
//!
//! let about = ns.read_file(&json!("about.md"))?;
//! let has_logo = ns.file_exists(&json!("static/logo.svg"))?;
//! let posts = ns.read_dir(&json!("content/posts"))?;
//! let env = ns.getenv(&json!("SITE_ENV"));
//! ```
//!
//! ## Modules
//!
//! - [`namespace`]: the four template accessors
//! - [`resolver`]: picks the effective store from the configured roots
//! - [`store`]: the store trait, disk and memory stores, overlay and read-only layers
//! - [`env`]: environment lookup
//! - [`value`]: argument coercion
//! - [`config`]: process-wide defaults

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod namespace;
pub mod resolver;
pub mod store;
pub mod value;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tpl_os::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DirEntry, Environment, ErrorKind, MapEnv, MemStore, Namespace, NamespaceBuilder,
        OsError, OsStore, ProcessEnv, SharedStore, Store,
    };
}

// =============================================================================
// High-Level API
// =============================================================================

pub use error::{ErrorKind, OsError};
pub use namespace::{Namespace, NamespaceBuilder};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use env::{Environment, MapEnv, ProcessEnv, SharedEnvironment};
pub use resolver::{EffectiveStore, Layout};
pub use store::{
    DirEntry, Lookup, MemStore, Metadata, OsStore, Overlay, ReadOnly, SharedStore, Store,
    StoreError, StoreResult, Unconfigured,
};
pub use value::{to_text, CoerceError};
