//! Per-profile user scope

use crate::ids::mint_user_id;
use crate::kv::SharedStore;
use crate::USER_ID_KEY;
use chrono::Utc;
use parking_lot::Mutex;

/// Stable user id namespacing all roadmap data
///
/// The id is created lazily on first access, persisted once and then
/// reused. It only changes after [`UserScope::forget`].
#[derive(Debug)]
pub struct UserScope {
    store: SharedStore,
    cached: Mutex<Option<String>>,
}

impl UserScope {
    /// Create scope over a store
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Current user id, minted and persisted on first call
    ///
    /// If the id cannot be persisted it is still used for the lifetime of
    /// this scope.
    pub fn user_id(&self) -> String {
        let mut cached = self.cached.lock();
        if let Some(id) = cached.as_ref() {
            return id.clone();
        }

        let id = match self.store.get(USER_ID_KEY).filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let id = mint_user_id(Utc::now());
                match self.store.set(USER_ID_KEY, &id) {
                    Ok(()) => tracing::info!(user_id = %id, "Created user scope"),
                    Err(e) => tracing::error!(user_id = %id, error = %e, "Failed to persist user id"),
                }
                id
            }
        };

        *cached = Some(id.clone());
        id
    }

    /// Drop the stored id so the next access mints a new one
    ///
    /// # Errors
    /// Returns error if the stored id cannot be removed
    pub fn forget(&self) -> Result<(), crate::error::StorageError> {
        let mut cached = self.cached.lock();
        self.store.remove(USER_ID_KEY)?;
        *cached = None;
        Ok(())
    }
}
