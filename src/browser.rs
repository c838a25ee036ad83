//! Browser glue: file saving, object URLs, `localStorage` preferences and the
//! document theme. Compiled for `wasm32` only.

use std::sync::{Arc, OnceLock};

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Storage, Url};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::state::{PreferenceStore, Theme};
use crate::transfer::{DownloadedFile, SaveTarget};

static CONFIG_CACHE: OnceLock<Arc<Config>> = OnceLock::new();

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Loads the client configuration once per page and hands out the cached copy
/// afterwards.
pub fn config(json: Option<&str>, network_flag: Option<&str>) -> AppResult<Arc<Config>> {
    if let Some(config) = CONFIG_CACHE.get() {
        return Ok(config.clone());
    }

    let config = Arc::new(Config::load(json, network_flag)?);
    let _ = CONFIG_CACHE.set(config.clone());
    Ok(config)
}

fn document() -> AppResult<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::Browser("no document available".into()))
}

fn to_blob(mime_type: &str, bytes: &[u8]) -> AppResult<Blob> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    Ok(Blob::new_with_u8_array_sequence_and_options(&parts, &options)?)
}

/// Creates an object URL for the file. The caller owns it and should revoke
/// it with [`revoke_object_url`] once the preview is closed.
pub fn object_url(file: &DownloadedFile) -> AppResult<String> {
    let blob = to_blob(&file.mime_type, &file.bytes)?;
    Ok(Url::create_object_url_with_blob(&blob)?)
}

pub fn revoke_object_url(url: &str) {
    if let Err(e) = Url::revoke_object_url(url) {
        Logger::new("browser").warn(
            "Failed to revoke object URL",
            log_data!("error" => format!("{:?}", e)),
        );
    }
}

/// Saves downloads through a temporary anchor element.
#[derive(Debug, Default)]
pub struct BrowserDownload;

impl SaveTarget for BrowserDownload {
    fn save(&mut self, file: &DownloadedFile) -> AppResult<()> {
        let url = object_url(file)?;
        let result = document()?
            .create_element("a")
            .map_err(AppError::from)
            .and_then(|el| {
                el.dyn_into::<HtmlAnchorElement>()
                    .map_err(|_| AppError::Browser("anchor element expected".into()))
            })
            .map(|anchor| {
                anchor.set_href(&url);
                anchor.set_download(&file.name);
                anchor.click();
            });
        revoke_object_url(&url);
        result
    }
}

/// [`PreferenceStore`] over `window.localStorage`. Storage errors are logged
/// and otherwise ignored.
pub struct LocalStoragePrefs {
    storage: Option<Storage>,
    logger: Logger,
}

impl Default for LocalStoragePrefs {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStoragePrefs {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self {
            storage,
            logger: Logger::new("preferences"),
        }
    }
}

impl PreferenceStore for LocalStoragePrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.set_item(key, value) {
            self.logger.warn(
                "Failed to persist preference",
                log_data!("key" => key, "error" => format!("{:?}", e)),
            );
        }
    }
}

/// Reflects the theme on `<html>` as a `data-theme` attribute and class.
pub fn apply_theme(theme: Theme) -> AppResult<()> {
    let root = document()?
        .document_element()
        .ok_or_else(|| AppError::Browser("no document element".into()))?;
    root.set_attribute("data-theme", theme.as_str())?;
    root.set_class_name(theme.as_str());
    Ok(())
}
