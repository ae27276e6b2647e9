//! Roadmap Store
//!
//! Local persistence for roadmap documents:
//! - [`KeyValueStore`]: the synchronous medium (in-memory or a JSON file)
//! - [`UserScope`]: the per-profile user id that namespaces all data
//! - [`RoadmapRepository`]: CRUD over the current user's collection
//! - [`BackupCodec`]: whole-collection export and destructive import
//!
//! # Persisted layout
//!
//! ```text
//! ai-roadmap-user-id    -> "user_<millis>_<random>"
//! ai-roadmap-data       -> { "<userId>": [RoadmapDocument, ...], ... }
//! ai-roadmap-backup-key -> "<most recent export's backup key>"
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_store::{MemoryStore, RoadmapRepository, UserScope};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let repo = RoadmapRepository::new(store.clone(), Arc::new(UserScope::new(store)));
//! let saved = repo.save(RoadmapDocument::new("Rust", "learn rust", "ship a crate"))?;
//! assert_eq!(repo.get_all().len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod backup;
pub mod error;
pub mod ids;
pub mod kv;
pub mod repository;
pub mod scope;

pub use backup::{BackupCodec, BackupSnapshot, SNAPSHOT_VERSION};
pub use error::{BackupError, FormatError, RepositoryError, StorageError};
pub use kv::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use repository::{RepositoryStats, RoadmapRepository};
pub use scope::UserScope;

/// Key holding the per-profile user id
pub const USER_ID_KEY: &str = "ai-roadmap-user-id";
/// Key holding every user's roadmap collection
pub const DATA_KEY: &str = "ai-roadmap-data";
/// Key holding the most recent export's backup key
pub const BACKUP_KEY_KEY: &str = "ai-roadmap-backup-key";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
