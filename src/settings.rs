use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::scene::Camera;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Simulation seconds added per frame.
    #[serde(default = "EditorSettings::default_delta_time")]
    pub delta_time: f64,
    #[serde(default = "EditorSettings::default_background_color")]
    pub background_color: [f32; 4],
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default = "EditorSettings::default_refresh_rate")]
    pub refresh_rate_hz: f64,
    /// Frames the native headless demo renders before exiting.
    #[serde(default = "EditorSettings::default_demo_frames")]
    pub demo_frames: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            delta_time: Self::default_delta_time(),
            background_color: Self::default_background_color(),
            camera: CameraSettings::default(),
            viewport: Viewport::default(),
            refresh_rate_hz: Self::default_refresh_rate(),
            demo_frames: Self::default_demo_frames(),
        }
    }
}

impl EditorSettings {
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            info!("Using default editor settings for WebAssembly build");
            return Self::default();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::load_from_path("settings.json")
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => {
                    info!("Loaded editor settings from {:?}", path);
                    settings
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default editor settings.",
                        path, err
                    );
                    EditorSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Editor settings file {:?} not found. Using default settings.",
                    path
                );
                EditorSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default editor settings.",
                    path, err
                );
                EditorSettings::default()
            }
        }
    }

    /// Parses and validates settings JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<EditorSettings>(json).map(Self::validate)
    }

    fn validate(mut self) -> Self {
        if !(self.delta_time > 0.0) {
            warn!("Delta time must be positive. Using default value.");
            self.delta_time = Self::default_delta_time();
        }

        if !(self.refresh_rate_hz > 0.0) {
            warn!("Refresh rate must be positive. Using default value.");
            self.refresh_rate_hz = Self::default_refresh_rate();
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            warn!("Viewport must be greater than zero. Using default viewport.");
            self.viewport = Viewport::default();
        }

        let camera = &self.camera;
        let fov_ok = camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0;
        let planes_ok = camera.near > 0.0 && camera.far > camera.near;
        if !fov_ok || !planes_ok {
            warn!("Camera fov must be in (0, 180) and 0 < near < far. Using default camera.");
            self.camera = CameraSettings::default();
        }

        self
    }

    /// A camera for the configured viewport.
    pub fn build_camera(&self) -> Camera {
        Camera::new(
            self.viewport.aspect_ratio(),
            self.camera.fov_y_degrees,
            self.camera.near,
            self.camera.far,
        )
    }

    const fn default_delta_time() -> f64 {
        0.01
    }

    const fn default_background_color() -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    const fn default_refresh_rate() -> f64 {
        60.0
    }

    const fn default_demo_frames() -> u64 {
        120
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = EditorSettings::from_json(r#"{ "delta_time": 0.02 }"#).unwrap();
        assert_eq!(settings.delta_time, 0.02);
        assert_eq!(settings.viewport.width, 1280);
        assert_eq!(settings.background_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn invalid_values_are_repaired() {
        let json = r#"{
            "delta_time": -1.0,
            "viewport": { "width": 0, "height": 600 },
            "camera": { "fov_y_degrees": 45.0, "near": 10.0, "far": 1.0 }
        }"#;
        let settings = EditorSettings::from_json(json).unwrap();
        assert_eq!(settings.delta_time, 0.01);
        assert_eq!(settings.viewport.width, 1280);
        assert_eq!(settings.camera.near, 0.1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorSettings::from_json("{ not json").is_err());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_file_uses_defaults() {
        let settings = EditorSettings::load_from_path("does/not/exist/settings.json");
        assert_eq!(settings.demo_frames, 120);
    }

    #[test]
    fn camera_uses_viewport_aspect() {
        let settings = EditorSettings::default();
        let camera = settings.build_camera();
        assert!((camera.aspect_ratio() - 1280.0 / 720.0).abs() < 1e-6);
    }
}
