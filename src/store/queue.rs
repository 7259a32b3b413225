use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use super::WindowStore;
use crate::collection::Snapshot;

/// Serializes layout writes into a store.
///
/// There is a single pending slot: a snapshot submitted while another one is
/// still waiting replaces it, and a drain writes snapshots one at a time until
/// the slot is empty. The last snapshot submitted is therefore always the last
/// one written.
///
/// A queue can start *held*: submissions are collected but nothing is written
/// until [`WriteQueue::release`], so a write cannot clear stored windows before
/// they have been read back.
pub struct WriteQueue<S> {
    store: S,
    state: RefCell<QueueState>,
}

#[derive(Default)]
struct QueueState {
    pending: Option<Snapshot>,
    draining: bool,
    held: bool,
}

impl<S: WindowStore> WriteQueue<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RefCell::new(QueueState::default()),
        }
    }

    pub fn held(store: S) -> Self {
        let queue = Self::new(store);
        queue.state.borrow_mut().held = true;
        queue
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue a layout. Returns true when the caller must start a drain.
    pub fn submit(&self, snapshot: Snapshot) -> bool {
        let mut state = self.state.borrow_mut();
        if state.pending.replace(snapshot).is_some() {
            debug!("superseded an unwritten layout");
        }
        state.start_drain()
    }

    /// Stop holding writes. `replacement` takes the place of whatever was
    /// submitted while held. Returns true when the caller must start a drain.
    pub fn release(&self, replacement: Option<Snapshot>) -> bool {
        let mut state = self.state.borrow_mut();
        state.held = false;
        state.pending = replacement;
        state.start_drain()
    }

    /// Write pending layouts until none is left.
    pub async fn drain(&self) {
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                match state.pending.take() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            if let Err(err) = self.store.save_all(next.windows()).await {
                warn!("layout of {} window(s) not saved: {err}", next.len());
            }
        }
    }
}

impl<S: WindowStore + 'static> WriteQueue<S> {
    /// Submit and, if needed, drain on the browser event loop.
    pub fn schedule(self: &Rc<Self>, snapshot: Snapshot) {
        if self.submit(snapshot) {
            self.spawn_drain();
        }
    }

    /// Release and, if needed, drain on the browser event loop.
    pub fn resume(self: &Rc<Self>, replacement: Option<Snapshot>) {
        if self.release(replacement) {
            self.spawn_drain();
        }
    }

    fn spawn_drain(self: &Rc<Self>) {
        let queue = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move { queue.drain().await });
    }
}

impl QueueState {
    fn start_drain(&mut self) -> bool {
        if self.held || self.draining || self.pending.is_none() {
            return false;
        }
        self.draining = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::StoreError;
    use crate::model::{StoredWindow, WindowId};
    use crate::store::MemoryStore;

    /// Remembers the ids of every layout it was asked to save.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        saves: RefCell<Vec<Vec<String>>>,
        failures_left: Cell<usize>,
    }

    impl WindowStore for RecordingStore {
        async fn save_all(&self, windows: &[StoredWindow]) -> Result<(), StoreError> {
            self.saves
                .borrow_mut()
                .push(windows.iter().map(|w| w.id.to_string()).collect());
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(StoreError::Transaction("quota exceeded".to_string()));
            }
            self.inner.save_all(windows).await
        }

        async fn load_all(&self) -> Result<Vec<StoredWindow>, StoreError> {
            self.inner.load_all().await
        }
    }

    fn snapshot(ids: &[&str]) -> Snapshot {
        let mut windows = crate::collection::WindowCollection::new(Rc::new(
            crate::handle::testing::FakeUrls::default(),
        ));
        let stored = ids
            .iter()
            .enumerate()
            .map(|(z, id)| StoredWindow {
                id: WindowId::from(id.to_string()),
                x: 0.0,
                y: 0.0,
                z: z as u32 + 1,
                image_name: format!("{id}.png"),
                image_type: "image/png".to_string(),
                image_bytes: Rc::from(&b"px"[..]),
            })
            .collect();
        let _ = windows.restore(stored);
        windows.snapshot()
    }

    fn stored_ids(queue: &WriteQueue<RecordingStore>) -> Vec<String> {
        let mut ids: Vec<String> = pollster::block_on(queue.store().load_all())
            .unwrap()
            .into_iter()
            .map(|w| w.id.to_string())
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn only_the_latest_unstarted_layout_is_written() {
        let queue = WriteQueue::new(RecordingStore::default());

        assert!(queue.submit(snapshot(&["a"])));
        assert!(!queue.submit(snapshot(&["a", "b"])));
        assert!(!queue.submit(snapshot(&["b"])));
        pollster::block_on(queue.drain());

        assert_eq!(*queue.store().saves.borrow(), vec![vec!["b".to_string()]]);
        assert_eq!(stored_ids(&queue), vec!["b"]);
    }

    #[test]
    fn a_finished_drain_lets_the_next_submit_start_another() {
        let queue = WriteQueue::new(RecordingStore::default());

        assert!(queue.submit(snapshot(&["a"])));
        pollster::block_on(queue.drain());
        assert!(queue.submit(snapshot(&[])));
        pollster::block_on(queue.drain());

        assert_eq!(queue.store().saves.borrow().len(), 2);
        assert!(stored_ids(&queue).is_empty());
    }

    #[test]
    fn held_queue_writes_nothing_until_released() {
        let queue = WriteQueue::held(RecordingStore::default());

        assert!(!queue.submit(snapshot(&[])));
        assert!(queue.store().saves.borrow().is_empty());

        assert!(queue.release(Some(snapshot(&["saved", "early"]))));
        assert!(!queue.submit(snapshot(&["saved", "early"])));
        pollster::block_on(queue.drain());

        assert_eq!(stored_ids(&queue), vec!["early", "saved"]);
        assert_eq!(queue.store().saves.borrow().len(), 1);
    }

    #[test]
    fn release_without_replacement_discards_held_writes() {
        let queue = WriteQueue::held(RecordingStore::default());
        pollster::block_on(queue.store().inner.save_all(snapshot(&["kept"]).windows())).unwrap();

        assert!(!queue.submit(snapshot(&[])));
        assert!(!queue.release(None));

        assert!(queue.store().saves.borrow().is_empty());
        assert_eq!(stored_ids(&queue), vec!["kept"]);
    }

    #[test]
    fn failed_save_does_not_stop_the_queue() {
        let store = RecordingStore::default();
        store.failures_left.set(1);
        let queue = WriteQueue::new(store);

        assert!(queue.submit(snapshot(&["lost"])));
        pollster::block_on(queue.drain());
        assert!(stored_ids(&queue).is_empty());

        assert!(queue.submit(snapshot(&["next"])));
        pollster::block_on(queue.drain());
        assert_eq!(stored_ids(&queue), vec!["next"]);
    }
}
