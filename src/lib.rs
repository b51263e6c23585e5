//! cctop: real-time file-activity monitor.
//!
//! A collector daemon watches a directory tree, classifies raw filesystem
//! signals into six semantic event kinds, and persists them into an
//! embedded SQLite store with trigger-maintained aggregates. A terminal
//! viewer streams, filters, and searches that store interactively.

pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod exclude;
pub mod keyword;
pub mod logging;
pub mod marker;
pub mod measurement;
pub mod model;
pub mod platform;
pub mod reconciler;
pub mod store;
pub mod version;
pub mod viewer;
pub mod watcher;

pub use cli::{parse_args, Command};
pub use config::{CollectorConfig, ViewerConfig};
pub use daemon::CollectorRuntime;
pub use error::{ContentionError, FatalError};
pub use model::{EventKind, EventRecord, FileRow, Measurement};
pub use store::Store;
pub use viewer::run_viewer;
