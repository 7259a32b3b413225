// Window records: the in-memory shape and the persisted layout

use std::fmt;
use std::rc::Rc;

use crate::gesture::{Point, Size};

pub const DEFAULT_X: f64 = 150.0;
pub const DEFAULT_Y: f64 = 150.0;
pub const DEFAULT_WIDTH: f64 = 240.0;
pub const DEFAULT_HEIGHT: f64 = 260.0;
pub const MIN_WIDTH: f64 = 180.0;
pub const MIN_HEIGHT: f64 = 200.0;

/// Stable identity of a window, assigned once at creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(String);

impl WindowId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image accepted from the picker or a drop, before it becomes a window.
#[derive(Clone, Debug)]
pub struct NewImage {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Authoritative state of one window for the current session.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub x: f64,
    pub y: f64,
    /// Stacking order; only the relative order matters.
    pub z: u32,
    pub width: f64,
    pub height: f64,
    pub image_name: String,
    pub image_type: String,
    pub image_bytes: Rc<[u8]>,
}

impl WindowRecord {
    pub fn from_image(image: NewImage, z: u32) -> Self {
        Self {
            id: WindowId::generate(),
            x: DEFAULT_X,
            y: DEFAULT_Y,
            z,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            image_name: image.name,
            image_type: image.mime,
            image_bytes: image.bytes.into(),
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The persisted part of the record. Size is session-only.
    pub fn to_stored(&self) -> StoredWindow {
        StoredWindow {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            z: self.z,
            image_name: self.image_name.clone(),
            image_type: self.image_type.clone(),
            image_bytes: Rc::clone(&self.image_bytes),
        }
    }
}

impl From<StoredWindow> for WindowRecord {
    fn from(stored: StoredWindow) -> Self {
        Self {
            id: stored.id,
            x: stored.x,
            y: stored.y,
            z: stored.z,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            image_name: stored.image_name,
            image_type: stored.image_type,
            image_bytes: stored.image_bytes,
        }
    }
}

/// One entry of the persisted layout.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredWindow {
    pub id: WindowId,
    pub x: f64,
    pub y: f64,
    pub z: u32,
    pub image_name: String,
    pub image_type: String,
    pub image_bytes: Rc<[u8]>,
}

/// Whether a declared media type names an image.
pub fn is_image_type(mime: &str) -> bool {
    mime.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn image() -> NewImage {
        NewImage {
            name: "cat.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn new_records_start_at_default_origin_and_size() {
        let record = WindowRecord::from_image(image(), 3);
        assert_eq!(record.origin(), Point::new(DEFAULT_X, DEFAULT_Y));
        assert_eq!(record.size(), Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(record.z, 3);
        assert_eq!(&record.image_bytes[..], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = WindowRecord::from_image(image(), 1);
        let b = WindowRecord::from_image(image(), 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn size_is_not_carried_through_the_stored_layout() {
        let mut record = WindowRecord::from_image(image(), 1);
        record.width = 700.0;
        record.height = 500.0;
        record.x = 12.0;

        let restored = WindowRecord::from(record.to_stored());

        assert_eq!(restored.x, 12.0);
        assert_eq!(restored.size(), Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(restored.image_bytes, record.image_bytes);
    }

    #[test]
    fn only_image_media_types_are_accepted() {
        assert!(is_image_type("image/png"));
        assert!(is_image_type("IMAGE/JPEG"));
        assert!(!is_image_type("text/plain"));
        assert!(!is_image_type(""));
        assert!(!is_image_type("image"));
    }
}
