// IndexedDB backend
//
// IDB reports completion through request/transaction callbacks; each wait is
// wrapped in a js Promise so it can be awaited as a JsFuture.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use log::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Event, IdbDatabase, IdbFactory, IdbObjectStoreParameters, IdbOpenDbRequest, IdbRequest,
    IdbTransaction, IdbTransactionMode,
};

use super::WindowStore;
use crate::error::{StoreError, describe_js};
use crate::model::{StoredWindow, WindowId};

const DB_NAME: &str = "image-windows";
const DB_VERSION: u32 = 1;
const STORE_NAME: &str = "windows";
const KEY_PATH: &str = "id";

/// Window records in one IndexedDB object store keyed by `id`.
pub struct IdbStore {
    factory: IdbFactory,
    // opened lazily, then reused
    db: RefCell<Option<IdbDatabase>>,
}

impl IdbStore {
    pub fn from_window() -> Result<Self, StoreError> {
        let factory = web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .indexed_db()
            .map_err(|_| StoreError::Unavailable)?
            .ok_or(StoreError::Unavailable)?;
        Ok(Self {
            factory,
            db: RefCell::new(None),
        })
    }

    async fn database(&self) -> Result<IdbDatabase, StoreError> {
        if let Some(db) = self.db.borrow().as_ref() {
            return Ok(db.clone());
        }

        let request = self
            .factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(|err| StoreError::Open(describe_js(&err)))?;

        let on_upgrade = {
            let request = request.clone();
            Closure::once_into_js(move |_ev: Event| {
                if let Err(err) = create_schema(&request) {
                    warn!("could not create the {STORE_NAME} store: {}", describe_js(&err));
                }
            })
        };
        request.set_onupgradeneeded(Some(on_upgrade.unchecked_ref()));

        let db: IdbDatabase = request_done(&request)
            .await
            .map_err(|err| StoreError::Open(describe_js(&err)))?
            .unchecked_into();
        debug!("opened {DB_NAME} v{DB_VERSION}");

        *self.db.borrow_mut() = Some(db.clone());
        Ok(db)
    }
}

impl fmt::Debug for IdbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdbStore")
            .field("database", &DB_NAME)
            .field("open", &self.db.borrow().is_some())
            .finish()
    }
}

impl WindowStore for IdbStore {
    async fn save_all(&self, windows: &[StoredWindow]) -> Result<(), StoreError> {
        let db = self.database().await?;
        let tx = db
            .transaction_with_str_and_mode(STORE_NAME, IdbTransactionMode::Readwrite)
            .map_err(transaction_error)?;
        let done = transaction_done(&tx);

        if let Err(err) = replace_all(&tx, windows) {
            // nothing of a half-written layout may be committed
            if let Err(abort) = tx.abort() {
                debug!("abort after failed write: {}", describe_js(&abort));
            }
            return Err(transaction_error(err));
        }

        done.await.map_err(transaction_error)?;
        debug!("saved {} window(s)", windows.len());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<StoredWindow>, StoreError> {
        let db = self.database().await?;
        let tx = db
            .transaction_with_str(STORE_NAME)
            .map_err(transaction_error)?;
        let request = tx
            .object_store(STORE_NAME)
            .and_then(|store| store.get_all())
            .map_err(transaction_error)?;

        let values: Array = request_done(&request)
            .await
            .map_err(transaction_error)?
            .dyn_into()
            .map_err(|value| StoreError::Malformed(describe_js(&value)))?;

        let mut windows = Vec::with_capacity(values.length() as usize);
        for value in values.iter() {
            match decode(&value) {
                Ok(window) => windows.push(window),
                Err(err) => warn!("skipping stored window: {err}"),
            }
        }
        Ok(windows)
    }
}

fn create_schema(request: &IdbOpenDbRequest) -> Result<(), JsValue> {
    let db: IdbDatabase = request.result()?.unchecked_into();
    if db.object_store_names().contains(STORE_NAME) {
        return Ok(());
    }
    let params = IdbObjectStoreParameters::new();
    params.set_key_path(&JsValue::from_str(KEY_PATH));
    db.create_object_store_with_optional_parameters(STORE_NAME, &params)?;
    Ok(())
}

fn replace_all(tx: &IdbTransaction, windows: &[StoredWindow]) -> Result<(), JsValue> {
    let store = tx.object_store(STORE_NAME)?;
    store.clear()?;
    for window in windows {
        store.put(&encode(window)?)?;
    }
    Ok(())
}

fn transaction_error(err: JsValue) -> StoreError {
    StoreError::Transaction(describe_js(&err))
}

/// Resolves with the request result on success, rejects with its error.
fn request_done(request: &IdbRequest) -> JsFuture {
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        let on_success = {
            let request = request.clone();
            Closure::once_into_js(move |_ev: Event| {
                let result = request.result().unwrap_or(JsValue::UNDEFINED);
                let _ = resolve.call1(&JsValue::NULL, &result);
            })
        };
        let on_error = {
            let request = request.clone();
            Closure::once_into_js(move |_ev: Event| {
                let error = request
                    .error()
                    .ok()
                    .flatten()
                    .map_or(JsValue::UNDEFINED, JsValue::from);
                let _ = reject.call1(&JsValue::NULL, &error);
            })
        };
        request.set_onsuccess(Some(on_success.unchecked_ref()));
        request.set_onerror(Some(on_error.unchecked_ref()));
    });
    JsFuture::from(promise)
}

/// Resolves once the transaction commits, rejects if it errors or aborts.
fn transaction_done(tx: &IdbTransaction) -> JsFuture {
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        let on_complete = Closure::once_into_js(move |_ev: Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let reject = Rc::new(reject);
        let failure = |what: &'static str| {
            let tx = tx.clone();
            let reject = Rc::clone(&reject);
            Closure::once_into_js(move |_ev: Event| {
                let reason = tx
                    .error()
                    .map_or_else(|| JsValue::from_str(what), JsValue::from);
                let _ = reject.call1(&JsValue::NULL, &reason);
            })
        };
        let on_error = failure("transaction error");
        let on_abort = failure("transaction aborted");
        tx.set_oncomplete(Some(on_complete.unchecked_ref()));
        tx.set_onerror(Some(on_error.unchecked_ref()));
        tx.set_onabort(Some(on_abort.unchecked_ref()));
    });
    JsFuture::from(promise)
}

fn encode(window: &StoredWindow) -> Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str(KEY_PATH), &JsValue::from_str(window.id.as_str()))?;
    Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from_f64(window.x))?;
    Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from_f64(window.y))?;
    Reflect::set(&obj, &JsValue::from_str("z"), &JsValue::from(window.z))?;
    Reflect::set(&obj, &JsValue::from_str("imageName"), &JsValue::from_str(&window.image_name))?;
    Reflect::set(&obj, &JsValue::from_str("imageType"), &JsValue::from_str(&window.image_type))?;
    Reflect::set(
        &obj,
        &JsValue::from_str("imageBytes"),
        &Uint8Array::from(&window.image_bytes[..]),
    )?;
    Ok(obj.into())
}

fn decode(value: &JsValue) -> Result<StoredWindow, StoreError> {
    let id = string_field(value, KEY_PATH)?;
    let z = number_field(value, "z")?;
    if z < 0.0 || z > f64::from(u32::MAX) {
        return Err(StoreError::Malformed(format!("{id}: stacking index {z}")));
    }
    let bytes = field(value, "imageBytes")?
        .dyn_into::<Uint8Array>()
        .map_err(|_| StoreError::Malformed(format!("{id}: imageBytes is not a byte array")))?;

    Ok(StoredWindow {
        x: number_field(value, "x")?,
        y: number_field(value, "y")?,
        z: z as u32,
        image_name: string_field(value, "imageName")?,
        // entries written without a type still display as a generic image
        image_type: string_field(value, "imageType").unwrap_or_default(),
        image_bytes: bytes.to_vec().into(),
        id: WindowId::from(id),
    })
}

fn field(value: &JsValue, key: &str) -> Result<JsValue, StoreError> {
    Reflect::get(value, &JsValue::from_str(key))
        .map_err(|err| StoreError::Malformed(format!("{key}: {}", describe_js(&err))))
}

fn string_field(value: &JsValue, key: &str) -> Result<String, StoreError> {
    field(value, key)?
        .as_string()
        .ok_or_else(|| StoreError::Malformed(format!("{key} is not a string")))
}

fn number_field(value: &JsValue, key: &str) -> Result<f64, StoreError> {
    field(value, key)?
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| StoreError::Malformed(format!("{key} is not a finite number")))
}
