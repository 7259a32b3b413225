//! Durable copy of the window layout.
//!
//! The store only ever sees whole layouts: [`WindowStore::save_all`]
//! replaces everything, [`WindowStore::load_all`] returns everything. Writes
//! reach it through the [`WriteQueue`], which keeps at most one save in flight.

mod idb;
mod memory;
mod queue;

pub use idb::IdbStore;
pub use memory::MemoryStore;
pub use queue::WriteQueue;

use log::warn;

use crate::error::StoreError;
use crate::model::StoredWindow;

/// Bulk persistence of window records, keyed by window id.
#[allow(async_fn_in_trait)]
pub trait WindowStore {
    /// Replace every stored record with `windows`, all or nothing.
    async fn save_all(&self, windows: &[StoredWindow]) -> Result<(), StoreError>;

    /// Every stored record, in no particular order.
    async fn load_all(&self) -> Result<Vec<StoredWindow>, StoreError>;
}

/// The store picked for this page.
#[derive(Debug)]
pub enum Backend {
    /// IndexedDB, survives reloads.
    Persistent(IdbStore),
    /// Nothing outlives the page; used when IndexedDB is missing.
    Session(MemoryStore),
}

impl Backend {
    pub fn open_default() -> Self {
        match IdbStore::from_window() {
            Ok(store) => Backend::Persistent(store),
            Err(err) => {
                warn!("{err}; windows will only last for this session");
                Backend::Session(MemoryStore::default())
            }
        }
    }
}

impl WindowStore for Backend {
    async fn save_all(&self, windows: &[StoredWindow]) -> Result<(), StoreError> {
        match self {
            Backend::Persistent(store) => store.save_all(windows).await,
            Backend::Session(store) => store.save_all(windows).await,
        }
    }

    async fn load_all(&self) -> Result<Vec<StoredWindow>, StoreError> {
        match self {
            Backend::Persistent(store) => store.load_all().await,
            Backend::Session(store) => store.load_all().await,
        }
    }
}
