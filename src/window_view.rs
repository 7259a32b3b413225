use js_sys::Function;
use leptos::prelude::*;
use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::PointerEvent;

use crate::app::{Queue, Workspace, persist};
use crate::error::describe_js;
use crate::gesture::{OPACITY_MAX, Point, ResizeSession, Size, snap_opacity};
use crate::model::WindowId;

type PointerCallback = Closure<dyn FnMut(PointerEvent)>;

/// Window-level listeners that follow a resize outside the handle.
struct ResizeListeners {
    on_move: PointerCallback,
    on_up: PointerCallback,
}

impl ResizeListeners {
    fn callbacks(&self) -> [(&'static str, &Function); 2] {
        [
            ("pointermove", self.on_move.as_ref().unchecked_ref()),
            ("pointerup", self.on_up.as_ref().unchecked_ref()),
        ]
    }

    fn attach(&self) {
        let Some(window) = web_sys::window() else { return };
        for (event, callback) in self.callbacks() {
            if let Err(err) = window.add_event_listener_with_callback(event, callback) {
                warn!("could not listen for {event}: {}", describe_js(&err));
            }
        }
    }

    fn detach(&self) {
        let Some(window) = web_sys::window() else { return };
        for (event, callback) in self.callbacks() {
            if let Err(err) = window.remove_event_listener_with_callback(event, callback) {
                warn!("could not stop listening for {event}: {}", describe_js(&err));
            }
        }
    }
}

#[component]
pub fn ImageWindow(id: WindowId, state: Workspace, queue: Queue) -> impl IntoView {
    let initial = state
        .with_untracked(|s| s.windows().get(&id).map(|w| w.record().size()))
        .unwrap_or_default();
    // follows the pointer while resizing, written back on release
    let size = RwSignal::new(initial);
    let opacity = RwSignal::new(OPACITY_MAX);
    let resize = StoredValue::new(None::<ResizeSession>);
    let listeners = StoredValue::new_local(None::<ResizeListeners>);

    let on_move = PointerCallback::new(move |ev: PointerEvent| {
        if let Some(session) = resize.get_value() {
            size.set(session.size_at(Point::from_mouse(&ev)));
        }
    });
    let on_up = PointerCallback::new({
        let id = id.clone();
        move |_ev: PointerEvent| {
            if resize.get_value().is_none() {
                return;
            }
            resize.set_value(None);
            listeners.with_value(|l| {
                if let Some(l) = l {
                    l.detach();
                }
            });
            let final_size = size.get_untracked();
            state.update(|s| {
                s.resize(&id, final_size);
            });
        }
    });
    listeners.set_value(Some(ResizeListeners { on_move, on_up }));
    on_cleanup(move || {
        listeners.try_with_value(|l| {
            if let Some(l) = l {
                l.detach();
            }
        });
    });

    let on_title_down = {
        let id = id.clone();
        move |ev: PointerEvent| {
            let pointer = Point::from_mouse(&ev);
            state.update(|s| {
                s.start_drag(&id, pointer);
            });
        }
    };
    let on_close_down = |ev: PointerEvent| ev.stop_propagation();
    let on_close = {
        let id = id.clone();
        move |_| {
            if let Some(snapshot) = state.try_update(|s| s.close(&id)).flatten() {
                persist(queue, snapshot);
            }
        }
    };
    let on_resize_down = move |ev: PointerEvent| {
        ev.stop_propagation();
        ev.prevent_default();
        resize.set_value(Some(ResizeSession::begin(
            Point::from_mouse(&ev),
            size.get_untracked(),
        )));
        listeners.with_value(|l| {
            if let Some(l) = l {
                l.attach();
            }
        });
    };
    let on_opacity = move |ev| {
        let value = event_target_value(&ev).parse().unwrap_or(OPACITY_MAX);
        opacity.set(snap_opacity(value));
    };

    let frame_style = {
        let id = id.clone();
        move || {
            let (x, y, z) = state
                .with(|s| {
                    s.windows().get(&id).map(|w| {
                        let r = w.record();
                        (r.x, r.y, r.z)
                    })
                })
                .unwrap_or_default();
            let Size { width, height } = size.get();
            format!("left:{x}px;top:{y}px;width:{width}px;height:{height}px;z-index:{z};")
        }
    };
    let title = {
        let id = id.clone();
        move || {
            state
                .with(|s| s.windows().get(&id).map(|w| w.record().image_name.clone()))
                .unwrap_or_default()
        }
    };
    let image_url = move || {
        state.with(|s| {
            s.windows()
                .get(&id)
                .and_then(|w| w.image_url().map(str::to_owned))
        })
    };

    view! {
        <div class="image-window" style=frame_style>
            <div class="title-bar" on:pointerdown=on_title_down>
                <span class="title">{title.clone()}</span>
                <button class="close" on:pointerdown=on_close_down on:click=on_close>
                    "✕"
                </button>
            </div>
            <div class="opacity" on:pointerdown=|ev: PointerEvent| ev.stop_propagation()>
                <label>"Opacity"</label>
                <input
                    type="range"
                    min="0.1"
                    max="1"
                    step="0.1"
                    prop:value=move || opacity.get().to_string()
                    on:input=on_opacity
                />
            </div>
            <div class="image">
                <img
                    src=image_url
                    alt=title
                    style=move || format!("opacity:{};", opacity.get())
                />
            </div>
            <div class="resize-handle" on:pointerdown=on_resize_down></div>
        </div>
    }
}
