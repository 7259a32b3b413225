use std::rc::Rc;

use js_sys::Uint8Array;
use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DragEvent, File, FileList, PointerEvent};

use crate::collection::Snapshot;
use crate::error::describe_js;
use crate::gesture::Point;
use crate::handle::{BlobUrls, ObjectUrls};
use crate::model::{NewImage, is_image_type};
use crate::store::{Backend, WindowStore, WriteQueue};
use crate::window_view::ImageWindow;
use crate::workspace::WorkspaceState;

pub type Workspace = RwSignal<WorkspaceState, LocalStorage>;
pub type Queue = StoredValue<Rc<WriteQueue<Backend>>, LocalStorage>;

fn file_list_to_vec(files: &FileList) -> Vec<File> {
    let mut out = Vec::new();
    for i in 0..files.length() {
        if let Some(f) = files.get(i) {
            out.push(f);
        }
    }
    out
}

async fn read_image(file: &File) -> Result<NewImage, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(NewImage {
        name: file.name(),
        mime: file.type_(),
        bytes: Uint8Array::new(&buffer).to_vec(),
    })
}

/// Hand a layout to the write queue.
pub fn persist(queue: Queue, snapshot: Snapshot) {
    queue.with_value(|queue| queue.schedule(snapshot));
}

/// Open a window for every image among `files`, in order.
async fn add_files(state: Workspace, queue: Queue, files: Vec<File>) {
    for file in files {
        let mime = file.type_();
        if !is_image_type(&mime) {
            debug!("ignoring {:?} ({mime:?})", file.name());
            continue;
        }
        let image = match read_image(&file).await {
            Ok(image) => image,
            Err(err) => {
                warn!("could not read {:?}: {}", file.name(), describe_js(&err));
                continue;
            }
        };
        if let Some(snapshot) = state.try_update(|s| s.open_image(image)) {
            persist(queue, snapshot);
        }
    }
}

/// Read the saved layout once, then let writes through.
async fn restore_saved(state: Workspace, queue: Queue) {
    let queue = queue.get_value();
    match queue.store().load_all().await {
        Ok(stored) => {
            let count = stored.len();
            let merged = state.try_update(|s| s.restore(stored)).flatten();
            info!("restored {count} saved window(s)");
            queue.resume(merged);
        }
        // writing now could wipe windows we failed to read
        Err(err) => warn!("saved windows unavailable, keeping this session only: {err}"),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let file_ref = NodeRef::<leptos::html::Input>::new();

    let urls: Rc<dyn ObjectUrls> = Rc::new(BlobUrls);
    let state: Workspace = RwSignal::new_local(WorkspaceState::new(urls));
    let queue: Queue = StoredValue::new_local(Rc::new(WriteQueue::held(Backend::open_default())));

    wasm_bindgen_futures::spawn_local(restore_saved(state, queue));

    let open_picker = move |_| {
        if let Some(input) = file_ref.get() {
            input.click();
        }
    };

    // file input onchange
    let on_files = move |_| {
        let Some(input) = file_ref.get() else { return };
        let Some(files) = input.files() else { return };
        let files = file_list_to_vec(&files);
        // reset input so selecting same file again triggers change
        input.set_value("");
        wasm_bindgen_futures::spawn_local(add_files(state, queue, files));
    };

    // drag & drop
    let on_drag_over = move |ev: DragEvent| {
        ev.prevent_default();
    };
    let on_drop = move |ev: DragEvent| {
        ev.prevent_default();
        let Some(dt) = ev.data_transfer() else { return };
        let Some(files) = dt.files() else { return };
        wasm_bindgen_futures::spawn_local(add_files(state, queue, file_list_to_vec(&files)));
    };

    // title-bar drags are tracked here, resizes inside each window
    let on_pointer_move = move |ev: PointerEvent| {
        if !state.with_untracked(WorkspaceState::is_dragging) {
            return;
        }
        let pointer = Point::from_mouse(&ev);
        state.update(|s| {
            s.drag_to(pointer);
        });
    };
    let on_pointer_up = move |_ev: PointerEvent| {
        if !state.with_untracked(WorkspaceState::is_dragging) {
            return;
        }
        if let Some(snapshot) = state.try_update(WorkspaceState::end_drag).flatten() {
            persist(queue, snapshot);
        }
    };

    let empty = Memo::new(move |_| state.with(|s| s.windows().is_empty()));

    view! {
        <div
            class="workspace"
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:dragover=on_drag_over
            on:drop=on_drop
        >
            <div class="toolbar">
                <span>"Drop an image here, or:"</span>
                <button on:click=open_picker>"Choose images"</button>
                {move || empty.get().then(|| view! { <span class="hint">"No windows open."</span> })}
            </div>

            <input node_ref=file_ref type="file" accept="image/*" multiple hidden on:change=on_files />

            <For
                each=move || state.with(|s| s.windows().ids())
                key=|id| id.clone()
                children=move |id| view! { <ImageWindow id=id state=state queue=queue /> }
            />
        </div>
    }
}
