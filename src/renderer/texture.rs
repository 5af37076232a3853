// renderer/texture.rs
use std::cell::RefCell;
use std::rc::Rc;

use super::error::{RenderError, RenderResult};
use super::handle::TextureHandle;
use super::resource::GpuState;

/// Textures are shared between materials by reference.
pub type SharedTexture = Rc<RefCell<Texture>>;

struct Pixels {
    data: Rc<[u8]>,
    width: u32,
    height: u32,
}

/// RGBA8 image with a two-step GPU lifecycle: the renderer allocates the
/// texture object first and uploads pixels once they are available.
pub struct Texture {
    name: String,
    pixels: Option<Pixels>,
    state: GpuState<TextureHandle>,
}

impl Texture {
    /// Wraps externally decoded RGBA8 pixels.
    pub fn from_rgba8(
        name: impl Into<String>,
        data: impl Into<Rc<[u8]>>,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let mut texture = Self::pending(name);
        texture.set_pixels(data, width, height)?;
        Ok(texture)
    }

    /// Decodes PNG or JPEG bytes.
    pub fn from_image_bytes(name: impl Into<String>, bytes: &[u8]) -> RenderResult<Self> {
        let name = name.into();
        log::info!("Decoding texture: {}", name);
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(name, rgba.into_raw(), width, height)
    }

    /// A 1x1 texture of one color.
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            pixels: Some(Pixels {
                data: Rc::from(&rgba[..]),
                width: 1,
                height: 1,
            }),
            state: GpuState::Unrealized,
        }
    }

    /// Two-color checkerboard, `size` pixels square.
    pub fn checkerboard(
        name: impl Into<String>,
        size: u32,
        checker_size: u32,
        color1: [u8; 4],
        color2: [u8; 4],
    ) -> Self {
        let checker_size = checker_size.max(1);
        let mut pixels = vec![0u8; (size * size * 4) as usize];

        for y in 0..size {
            for x in 0..size {
                let checker_x = (x / checker_size) % 2;
                let checker_y = (y / checker_size) % 2;
                let color = if (checker_x + checker_y) % 2 == 0 {
                    color1
                } else {
                    color2
                };
                let idx = ((y * size + x) * 4) as usize;
                pixels[idx..idx + 4].copy_from_slice(&color);
            }
        }

        Self {
            name: name.into(),
            pixels: Some(Pixels {
                data: pixels.into(),
                width: size,
                height: size,
            }),
            state: GpuState::Unrealized,
        }
    }

    /// A texture whose pixels are still loading. It is allocated on the GPU
    /// but skipped for upload until [`set_pixels`](Self::set_pixels) runs.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pixels: None,
            state: GpuState::Unrealized,
        }
    }

    pub fn into_shared(self) -> SharedTexture {
        Rc::new(RefCell::new(self))
    }

    /// Same pixels, independent GPU lifecycle.
    pub fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            pixels: self.pixels.as_ref().map(|pixels| Pixels {
                data: Rc::clone(&pixels.data),
                width: pixels.width,
                height: pixels.height,
            }),
            state: GpuState::Unrealized,
        }
    }

    pub fn set_pixels(
        &mut self,
        data: impl Into<Rc<[u8]>>,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        let data = data.into();
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::ResourceCreation {
                kind: "texture",
                reason: format!(
                    "{}: expected {} bytes for {}x{} RGBA8, got {}",
                    self.name,
                    expected,
                    width,
                    height,
                    data.len()
                ),
            });
        }

        self.pixels = Some(Pixels {
            data,
            width,
            height,
        });
        if let GpuState::Uploaded(handle) = self.state {
            self.state = GpuState::Allocated(handle);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.pixels.as_ref().map(|pixels| &*pixels.data)
    }

    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |pixels| pixels.width)
    }

    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |pixels| pixels.height)
    }

    pub fn has_pixels(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn state(&self) -> GpuState<TextureHandle> {
        self.state
    }

    pub fn created(&self) -> bool {
        self.state.created()
    }

    pub fn loaded(&self) -> bool {
        self.state.loaded()
    }

    pub(crate) fn set_state(&mut self, state: GpuState<TextureHandle>) {
        self.state = state;
    }

    pub fn reset_created(&mut self) -> Option<TextureHandle> {
        self.state.invalidate()
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::handle::Handle;

    #[test]
    fn rejects_mismatched_pixel_count() {
        let result = Texture::from_rgba8("bad", vec![0u8; 15], 2, 2);
        assert!(matches!(result, Err(RenderError::ResourceCreation { .. })));
    }

    #[test]
    fn new_pixels_force_reupload() {
        let mut texture = Texture::from_rgba8("checker", vec![255u8; 16], 2, 2).unwrap();
        texture.set_state(GpuState::Uploaded(Handle::new(0)));
        texture.set_pixels(vec![0u8; 4], 1, 1).unwrap();
        assert!(texture.created());
        assert!(!texture.loaded());
        assert_eq!(texture.width(), 1);
    }

    #[test]
    fn duplicate_does_not_share_gpu_state() {
        let mut texture = Texture::from_rgba8("a", vec![1u8; 4], 1, 1).unwrap();
        texture.set_state(GpuState::Uploaded(Handle::new(9)));
        let copy = texture.duplicate();
        assert!(!copy.created());
        assert_eq!(copy.data(), texture.data());
    }

    #[test]
    fn decodes_png_bytes() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let texture = Texture::from_image_bytes("decoded", &png).unwrap();
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(&texture.data().unwrap()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let texture = Texture::checkerboard("checker", 4, 2, [255; 4], [0, 0, 0, 255]);
        let data = texture.data().unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(&data[0..4], &[255; 4]);
        // Pixel (2, 0) starts the second cell
        assert_eq!(&data[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = Texture::from_image_bytes("noise", &[1, 2, 3, 4]);
        assert!(matches!(result, Err(RenderError::TextureDecode(_))));
    }
}
