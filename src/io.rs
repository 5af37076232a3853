use std::path::Path;

use crate::renderer::{RenderError, RenderResult};

#[cfg(target_arch = "wasm32")]
use web_sys::XmlHttpRequest;
#[cfg(target_arch = "wasm32")]
use web_sys::XmlHttpRequestResponseType;

#[cfg(target_arch = "wasm32")]
fn normalize_web_path(path: &Path) -> RenderResult<String> {
    let mut path_str = path.to_string_lossy().replace('\\', "/");

    while let Some(stripped) = path_str.strip_prefix("./") {
        path_str = stripped.to_string();
    }

    if path_str.starts_with('/') {
        path_str.remove(0);
    }

    if path_str.is_empty() {
        return Err(RenderError::Io("Cannot load empty web path".into()));
    }

    Ok(path_str)
}

#[cfg(target_arch = "wasm32")]
fn fetch_bytes_sync(url: &str) -> RenderResult<Vec<u8>> {
    let io = |message: String| RenderError::Io(message);

    let request = XmlHttpRequest::new()
        .map_err(|err| io(format!("Failed to create XMLHttpRequest: {:?}", err)))?;
    request
        .open_with_async("GET", url, false)
        .map_err(|err| io(format!("Failed to open request for {}: {:?}", url, err)))?;
    request.set_response_type(XmlHttpRequestResponseType::Arraybuffer);
    request
        .send()
        .map_err(|err| io(format!("Failed to send request for {}: {:?}", url, err)))?;

    let status = request
        .status()
        .map_err(|err| io(format!("Failed to get status for {}: {:?}", url, err)))?;

    if !(200..400).contains(&status) {
        return Err(io(format!("HTTP {} when requesting {}", status, url)));
    }

    let buffer = request
        .response()
        .map_err(|err| io(format!("Failed to get response body for {}: {:?}", url, err)))?;

    if buffer.is_null() || buffer.is_undefined() {
        return Err(io(format!("No response body for {}", url)));
    }

    let array = js_sys::Uint8Array::new(&buffer);
    let mut bytes = vec![0u8; array.length() as usize];
    array.copy_to(&mut bytes);
    Ok(bytes)
}

/// Reads a whole file: from disk natively, over HTTP relative to the page
/// in the browser.
pub fn load_binary(path: &Path) -> RenderResult<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    {
        fetch_bytes_sync(&normalize_web_path(path)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::fs::read(path).map_err(|err| RenderError::Io(format!("Failed to read {:?}: {}", path, err)))
    }
}

pub fn load_text(path: &Path) -> RenderResult<String> {
    let bytes = load_binary(path)?;
    String::from_utf8(bytes)
        .map_err(|err| RenderError::Io(format!("{:?} is not valid UTF-8: {}", path, err)))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let result = load_text(Path::new("no/such/model.obj"));
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn reads_text_back() {
        let path = std::env::temp_dir().join("scene_forge_io_test.obj");
        std::fs::write(&path, "v 0 0 0\n").unwrap();
        assert_eq!(load_text(&path).unwrap(), "v 0 0 0\n");
        let _ = std::fs::remove_file(path);
    }
}
