//! Saving export payloads to a file the user chooses.
//!
//! In the browser the payload becomes a Blob behind an object URL and a
//! temporary anchor triggers the download. On native builds a save dialog
//! picks the path and the whole payload is written in one call.

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadError {
    /// Writing the file failed.
    Io(String),
    /// A browser API call failed.
    Browser(String),
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadError::Io(msg) => write!(f, "Could not save file: {}", msg),
            DownloadError::Browser(msg) => write!(f, "Download failed: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

/// What happened to a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to the given location
    Saved(String),
    /// The user dismissed the dialog
    Cancelled,
}

pub const MIME_GEOJSON: &str = "application/geo+json";
pub const MIME_TEXT: &str = "text/plain;charset=utf-8";
pub const MIME_PNG: &str = "image/png";

#[cfg(not(target_arch = "wasm32"))]
pub fn save_file(file_name: &str, _mime: &str, bytes: &[u8]) -> Result<SaveOutcome, DownloadError> {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save export")
        .set_file_name(file_name)
        .save_file()
    else {
        log::info!("Save of {} cancelled", file_name);
        return Ok(SaveOutcome::Cancelled);
    };

    write_payload(&path, bytes)?;
    let shown = path.display().to_string();
    log::info!("Saved {} bytes to {}", bytes.len(), shown);
    Ok(SaveOutcome::Saved(shown))
}

#[cfg(not(target_arch = "wasm32"))]
fn write_payload(path: &std::path::Path, bytes: &[u8]) -> Result<(), DownloadError> {
    std::fs::write(path, bytes).map_err(|e| DownloadError::Io(format!("{}: {}", path.display(), e)))
}

#[cfg(target_arch = "wasm32")]
pub fn save_file(file_name: &str, mime: &str, bytes: &[u8]) -> Result<SaveOutcome, DownloadError> {
    use wasm_bindgen::JsCast;

    let js_err = |e: wasm_bindgen::JsValue| DownloadError::Browser(format!("{:?}", e));

    let window = web_sys::window().ok_or_else(|| DownloadError::Browser("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| DownloadError::Browser("no document".to_string()))?;
    let body = document
        .body()
        .ok_or_else(|| DownloadError::Browser("no body".to_string()))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(js_err)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_err)?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| DownloadError::Browser("anchor element has the wrong type".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    body.append_child(&anchor).map_err(js_err)?;
    anchor.click();
    let _ = body.remove_child(&anchor);
    let _ = web_sys::Url::revoke_object_url(&url);

    log::info!("Downloaded {} ({} bytes)", file_name, bytes.len());
    Ok(SaveOutcome::Saved(file_name.to_string()))
}
