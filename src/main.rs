// image-desk - image windows on a browser workspace
// Drop or pick images; each becomes a movable, resizable window whose layout
// is kept in IndexedDB across reloads.

mod app;
mod collection;
mod error;
mod gesture;
mod handle;
mod logging;
mod model;
mod store;
mod window_view;
mod workspace;

use leptos::prelude::*;
use log::LevelFilter;

use crate::app::App;

fn main() {
    console_error_panic_hook::set_once();
    logging::init(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    mount_to_body(|| view! { <App /> });
}
