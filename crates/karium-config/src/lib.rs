pub mod builtins;
pub mod config;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod external;
pub mod loader;
pub mod manifest;
pub mod merge;
pub mod options;

// Re-export main types
pub use config::*;
pub use entry::*;
pub use error::*;
pub use external::{External, is_external};
pub use manifest::PackageManifest;
pub use options::{BuildOptions, default_layer};

pub use discovery::ConfigDiscovery;
pub use loader::{FileModuleLoader, ModuleLoader};
pub use merge::{Defaults, merge_json_defaults, merge_layers};
