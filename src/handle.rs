// Displayable handles for image payloads (blob object URLs)

use std::fmt;
use std::rc::Rc;

use js_sys::{Array, Uint8Array};
use log::warn;
use web_sys::{Blob, BlobPropertyBag, Url};

use crate::error::{HandleError, describe_js};

/// Host facility that turns bytes into a locally resolvable URL and back.
pub trait ObjectUrls {
    fn create(&self, bytes: &[u8], mime: &str) -> Result<String, HandleError>;
    fn revoke(&self, url: &str);
}

/// `URL.createObjectURL` over an in-memory `Blob`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobUrls;

impl ObjectUrls for BlobUrls {
    fn create(&self, bytes: &[u8], mime: &str) -> Result<String, HandleError> {
        let parts = Array::new();
        parts.push(&Uint8Array::from(bytes));

        let options = BlobPropertyBag::new();
        options.set_type(mime);

        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|err| HandleError(describe_js(&err)))?;
        Url::create_object_url_with_blob(&blob).map_err(|err| HandleError(describe_js(&err)))
    }

    fn revoke(&self, url: &str) {
        if let Err(err) = Url::revoke_object_url(url) {
            warn!("failed to revoke {url}: {}", describe_js(&err));
        }
    }
}

/// An object URL owned by one window. Revoked when dropped.
pub struct ImageHandle {
    url: String,
    urls: Rc<dyn ObjectUrls>,
}

impl ImageHandle {
    pub fn create(urls: &Rc<dyn ObjectUrls>, bytes: &[u8], mime: &str) -> Result<Self, HandleError> {
        let url = urls.create(bytes, mime)?;
        Ok(Self {
            url,
            urls: Rc::clone(urls),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.urls.revoke(&self.url);
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle").field("url", &self.url).finish()
    }
}
