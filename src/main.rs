#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;
#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use scene_forge::demo_scenes;
#[cfg(not(target_arch = "wasm32"))]
use scene_forge::renderer::{Call, HeadlessContext, RenderResult, Renderer};
#[cfg(not(target_arch = "wasm32"))]
use scene_forge::settings::EditorSettings;
#[cfg(not(target_arch = "wasm32"))]
use scene_forge::time::SystemClock;

/// Renders a demo scene without a window and reports what was drawn. With a
/// path argument the scene holds that OBJ model instead of the primitives.
#[cfg(not(target_arch = "wasm32"))]
fn run(model: Option<&str>) -> RenderResult<()> {
    let settings = EditorSettings::load();

    let mut scene = match model {
        Some(path) => {
            let text = scene_forge::io::load_text(Path::new(path))?;
            let name = Path::new(path)
                .file_stem()
                .map_or_else(|| path.to_string(), |stem| stem.to_string_lossy().into_owned());
            demo_scenes::model_scene(&settings, &text, &name)?
        }
        None => demo_scenes::primitives_scene(&settings),
    };

    let mut renderer = Renderer::new(HeadlessContext::new());
    renderer.set_viewport(settings.viewport.width, settings.viewport.height);

    let mut clock =
        SystemClock::new(settings.refresh_rate_hz).with_frame_limit(settings.demo_frames);
    let stats = renderer.run(&mut scene, &mut clock)?;

    for object in scene.objects() {
        if let Some(report) = renderer.validate_material(object.material()) {
            if !report.is_clean() {
                log::warn!("{}: unmatched properties {:?}", object.name(), report.unmatched);
            }
        }
    }

    let draws = renderer
        .context()
        .count(|call| matches!(call, Call::DrawIndexed(_)));
    log::info!(
        "Drew {} frames ({:.2}s wall, {:.2}s simulated) with {} draw calls",
        stats.frames,
        stats.last_frame_at,
        scene.time(),
        draws
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    scene_forge::init_logging();
    log::info!("Starting scene-forge headless demo");

    let model = std::env::args().nth(1);
    match run(model.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Application error: {}", err);
            ExitCode::FAILURE
        }
    }
}

// The browser build starts from `scene_forge::web::mount_viewport`.
#[cfg(target_arch = "wasm32")]
fn main() {}
