// Workspace state: the window collection plus the title-bar drag gesture

use std::rc::Rc;

use log::debug;

use crate::collection::{Snapshot, WindowCollection};
use crate::gesture::{DragSession, Point, Size};
use crate::handle::ObjectUrls;
use crate::model::{NewImage, StoredWindow, WindowId};

pub struct WorkspaceState {
    windows: WindowCollection,
    drag: Option<DragSession>,
}

impl WorkspaceState {
    pub fn new(urls: Rc<dyn ObjectUrls>) -> Self {
        Self {
            windows: WindowCollection::new(urls),
            drag: None,
        }
    }

    pub fn windows(&self) -> &WindowCollection {
        &self.windows
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn restore(&mut self, stored: Vec<StoredWindow>) -> Option<Snapshot> {
        self.windows.restore(stored)
    }

    pub fn open_image(&mut self, image: NewImage) -> Snapshot {
        self.windows.add(image).1
    }

    pub fn close(&mut self, id: &WindowId) -> Option<Snapshot> {
        if self.drag.as_ref().is_some_and(|drag| &drag.id == id) {
            self.drag = None;
        }
        self.windows.remove(id)
    }

    /// Title-bar press: begin the drag, then raise the window.
    pub fn start_drag(&mut self, id: &WindowId, pointer: Point) -> bool {
        if !self.begin_drag(id, pointer) {
            return false;
        }
        self.windows.bring_to_front(id);
        true
    }

    pub fn begin_drag(&mut self, id: &WindowId, pointer: Point) -> bool {
        let Some(window) = self.windows.get(id) else {
            return false;
        };
        self.drag = Some(DragSession::begin(id.clone(), pointer, window.record().origin()));
        true
    }

    /// Live move; nothing is persisted until the drag ends.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let origin = drag.origin_at(pointer);
        self.windows.update_position(&drag.id, origin)
    }

    /// Pointer release: the layout to persist, if a drag was active.
    pub fn end_drag(&mut self) -> Option<Snapshot> {
        let drag = self.drag.take()?;
        debug!("drag of {} ended", drag.id);
        Some(self.windows.snapshot())
    }

    /// Resize release. Size is session-only, so there is nothing to persist.
    pub fn resize(&mut self, id: &WindowId, size: Size) -> bool {
        self.windows.update_size(id, size)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handle::testing::FakeUrls;
    use crate::model::{DEFAULT_X, DEFAULT_Y, MIN_HEIGHT, MIN_WIDTH};

    fn workspace_with(names: &[&str]) -> (WorkspaceState, Vec<WindowId>) {
        let mut state = WorkspaceState::new(Rc::new(FakeUrls::default()));
        for name in names {
            let _ = state.open_image(NewImage {
                name: name.to_string(),
                mime: "image/webp".to_string(),
                bytes: vec![1, 2, 3],
            });
        }
        let ids = state.windows().ids();
        (state, ids)
    }

    fn stored_position(snapshot: &Snapshot, id: &WindowId) -> Point {
        let w = snapshot.windows().iter().find(|w| &w.id == id).unwrap();
        Point::new(w.x, w.y)
    }

    #[test]
    fn dragging_moves_by_pointer_delta_and_persists_on_release() {
        let (mut state, ids) = workspace_with(&["a"]);
        let id = &ids[0];
        let press = Point::new(DEFAULT_X + 30.0, DEFAULT_Y + 10.0);

        assert!(state.start_drag(id, press));
        assert!(state.drag_to(Point::new(press.x + 5.0, press.y + 5.0)));
        assert!(state.drag_to(Point::new(press.x + 120.0, press.y - 40.0)));

        let expected = Point::new(DEFAULT_X + 120.0, DEFAULT_Y - 40.0);
        assert_eq!(state.windows().get(id).unwrap().record().origin(), expected);

        let snapshot = state.end_drag().expect("release persists");
        assert_eq!(stored_position(&snapshot, id), expected);
        assert!(!state.is_dragging());
    }

    #[test]
    fn starting_a_drag_raises_the_window() {
        let (mut state, ids) = workspace_with(&["a", "b"]);

        assert!(state.start_drag(&ids[0], Point::new(160.0, 160.0)));

        let z = |id: &WindowId| state.windows().get(id).unwrap().record().z;
        assert!(z(&ids[0]) > z(&ids[1]));
    }

    #[test]
    fn release_without_drag_persists_nothing() {
        let (mut state, _ids) = workspace_with(&["a"]);
        assert!(!state.drag_to(Point::new(1.0, 1.0)));
        assert_eq!(state.end_drag(), None);
    }

    #[test]
    fn drag_on_unknown_window_does_not_start() {
        let (mut state, _ids) = workspace_with(&["a"]);
        assert!(!state.start_drag(&WindowId::generate(), Point::default()));
        assert!(!state.is_dragging());
    }

    #[test]
    fn closing_the_dragged_window_ends_the_drag() {
        let (mut state, ids) = workspace_with(&["a", "b"]);
        assert!(state.start_drag(&ids[1], Point::new(150.0, 150.0)));

        let snapshot = state.close(&ids[1]).unwrap();

        assert!(!state.is_dragging());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(state.end_drag(), None);
    }

    #[test]
    fn closing_an_unknown_window_is_a_no_op() {
        let (mut state, _ids) = workspace_with(&["a"]);
        assert_eq!(state.close(&WindowId::generate()), None);
        assert_eq!(state.windows().len(), 1);
    }

    #[test]
    fn resize_updates_memory_with_minimum_enforced() {
        let (mut state, ids) = workspace_with(&["a"]);

        assert!(state.resize(&ids[0], Size::new(-300.0, 50.0)));

        assert_eq!(
            state.windows().get(&ids[0]).unwrap().record().size(),
            Size::new(MIN_WIDTH, MIN_HEIGHT)
        );
    }
}
