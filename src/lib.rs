pub mod demo_scenes;
pub mod io;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    // Set panic hook to get better error messages
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    // A second init (e.g. a remounted viewport) keeps the first logger
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_logging();
    log::info!("scene-forge loaded - WebAssembly");
    Ok(())
}
