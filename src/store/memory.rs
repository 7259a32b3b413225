use std::cell::RefCell;
use std::collections::BTreeMap;

use super::WindowStore;
use crate::error::StoreError;
use crate::model::{StoredWindow, WindowId};

/// Session-only store: a map from window id to record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<WindowId, StoredWindow>>,
}

impl WindowStore for MemoryStore {
    async fn save_all(&self, windows: &[StoredWindow]) -> Result<(), StoreError> {
        let mut records = self.records.borrow_mut();
        records.clear();
        for window in windows {
            records.insert(window.id.clone(), window.clone());
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredWindow>, StoreError> {
        Ok(self.records.borrow().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn window(id: &str, z: u32, bytes: &[u8]) -> StoredWindow {
        StoredWindow {
            id: WindowId::from(id.to_string()),
            x: 3.5,
            y: -8.0,
            z,
            image_name: format!("{id}.jpg"),
            image_type: "image/jpeg".to_string(),
            image_bytes: Rc::from(bytes),
        }
    }

    fn sorted(mut windows: Vec<StoredWindow>) -> Vec<StoredWindow> {
        windows.sort_by(|a, b| a.id.cmp(&b.id));
        windows
    }

    #[test]
    fn never_written_store_loads_empty() {
        let store = MemoryStore::default();
        assert_eq!(pollster::block_on(store.load_all()).unwrap(), Vec::new());
    }

    #[test]
    fn save_then_load_round_trips_records_and_bytes() {
        let store = MemoryStore::default();
        let saved = vec![window("a", 1, &[0, 1, 2, 255]), window("b", 4, b"")];

        pollster::block_on(store.save_all(&saved)).unwrap();
        let loaded = pollster::block_on(store.load_all()).unwrap();

        assert_eq!(sorted(loaded), saved);
    }

    #[test]
    fn save_replaces_the_previous_set() {
        let store = MemoryStore::default();
        pollster::block_on(store.save_all(&[window("a", 1, b"a"), window("b", 2, b"b")])).unwrap();
        pollster::block_on(store.save_all(&[window("c", 3, b"c")])).unwrap();

        let loaded = pollster::block_on(store.load_all()).unwrap();
        let ids: Vec<&str> = loaded.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }
}
