//! The authoritative list of open windows for the current session.
//!
//! Every mutation is applied synchronously. Mutations that must reach the
//! persistent store return a [`Snapshot`]; the caller hands it to the write
//! queue. Transient changes (live drag position, size) return nothing.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, warn};

use crate::gesture::{Point, Size};
use crate::handle::{ImageHandle, ObjectUrls};
use crate::model::{NewImage, StoredWindow, WindowId, WindowRecord};

/// Full persisted layout at one point in time.
#[must_use = "a snapshot is only useful once handed to the write queue"]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot(Vec<StoredWindow>);

impl Snapshot {
    pub fn windows(&self) -> &[StoredWindow] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A window record together with its displayable image.
#[derive(Debug)]
pub struct OpenWindow {
    record: WindowRecord,
    // None when the host refused to create a URL
    image: Option<ImageHandle>,
}

impl OpenWindow {
    fn open(record: WindowRecord, urls: &Rc<dyn ObjectUrls>) -> Self {
        let image = match ImageHandle::create(urls, &record.image_bytes, &record.image_type) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!("window {} shown without image: {err}", record.id);
                None
            }
        };
        Self { record, image }
    }

    pub fn record(&self) -> &WindowRecord {
        &self.record
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().map(ImageHandle::url)
    }
}

pub struct WindowCollection {
    windows: Vec<OpenWindow>,
    urls: Rc<dyn ObjectUrls>,
}

impl WindowCollection {
    pub fn new(urls: Rc<dyn ObjectUrls>) -> Self {
        Self {
            windows: Vec::new(),
            urls,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, id: &WindowId) -> Option<&OpenWindow> {
        self.windows.iter().find(|w| &w.record.id == id)
    }

    fn get_mut(&mut self, id: &WindowId) -> Option<&mut OpenWindow> {
        self.windows.iter_mut().find(|w| &w.record.id == id)
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.iter().map(|w| w.record.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenWindow> {
        self.windows.iter()
    }

    /// Highest stacking index in use, 0 when there are no windows.
    pub fn top_z(&self) -> u32 {
        self.windows.iter().map(|w| w.record.z).max().unwrap_or(0)
    }

    fn others_top(&self, id: &WindowId) -> Option<u32> {
        self.iter()
            .filter(|w| &w.record.id != id)
            .map(|w| w.record.z)
            .max()
    }

    /// Stacking index above every window. Renumbers first when the top is
    /// already `u32::MAX`.
    fn next_z(&mut self) -> u32 {
        if self.top_z() == u32::MAX {
            self.compact_z();
        }
        self.top_z() + 1
    }

    /// Renumber `z` to 1..=n, keeping the current stacking order.
    fn compact_z(&mut self) {
        let mut order: Vec<usize> = (0..self.windows.len()).collect();
        order.sort_by_key(|&i| self.windows[i].record.z);
        for (z, i) in (1..).zip(order) {
            self.windows[i].record.z = z;
        }
        debug!("renumbered {} window(s)", self.len());
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.windows.iter().map(|w| w.record.to_stored()).collect())
    }

    /// Materialize stored windows, keeping anything opened this session.
    ///
    /// Restored windows are ordered by `z`. Windows that already exist keep
    /// their relative order but are lifted above the restored ones, and stored
    /// entries whose id is already present are skipped. Returns a snapshot
    /// when the merged list differs from what was stored.
    pub fn restore(&mut self, mut stored: Vec<StoredWindow>) -> Option<Snapshot> {
        let session = std::mem::take(&mut self.windows);
        let present: HashSet<WindowId> = session.iter().map(|w| w.record.id.clone()).collect();

        stored.retain(|w| !present.contains(&w.id));
        stored.sort_by_key(|w| w.z);
        let lift = stored.last().map_or(0, |w| w.z);

        self.windows = stored
            .into_iter()
            .map(|w| OpenWindow::open(WindowRecord::from(w), &self.urls))
            .collect();
        debug!("restored {} window(s)", self.len());

        if session.is_empty() {
            return None;
        }
        for mut window in session {
            window.record.z = window.record.z.saturating_add(lift);
            self.windows.push(window);
        }
        Some(self.snapshot())
    }

    /// Open a window for an accepted image, stacked above everything else.
    pub fn add(&mut self, image: NewImage) -> (WindowId, Snapshot) {
        let z = self.next_z();
        let record = WindowRecord::from_image(image, z);
        let id = record.id.clone();
        debug!("opening window {id} for {:?}", record.image_name);
        self.windows.push(OpenWindow::open(record, &self.urls));
        (id, self.snapshot())
    }

    /// Close a window and release its image. `None` when the id is unknown.
    pub fn remove(&mut self, id: &WindowId) -> Option<Snapshot> {
        let index = self.windows.iter().position(|w| &w.record.id == id)?;
        // dropping the window revokes its image URL
        self.windows.remove(index);
        debug!("closed window {id}");
        Some(self.snapshot())
    }

    /// Raise a window above all others. Returns whether its `z` changed.
    pub fn bring_to_front(&mut self, id: &WindowId) -> bool {
        let Some(z) = self.get(id).map(|w| w.record.z) else {
            return false;
        };
        let Some(mut top) = self.others_top(id) else {
            return false;
        };
        if z > top {
            return false;
        }
        if top == u32::MAX {
            self.compact_z();
            top = self.others_top(id).unwrap_or(0);
        }
        if let Some(window) = self.get_mut(id) {
            window.record.z = top + 1;
        }
        true
    }

    pub fn update_position(&mut self, id: &WindowId, origin: Point) -> bool {
        let Some(window) = self.get_mut(id) else {
            return false;
        };
        window.record.x = origin.x;
        window.record.y = origin.y;
        true
    }

    pub fn update_size(&mut self, id: &WindowId, size: Size) -> bool {
        let Some(window) = self.get_mut(id) else {
            return false;
        };
        let size = size.at_least_minimum();
        window.record.width = size.width;
        window.record.height = size.height;
        true
    }
}
