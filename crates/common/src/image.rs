use glam::Vec2;

use crate::CommonError;

/// An 8-bit RGB pixel.
pub type Rgb = [u8; 3];

/// Row-major RGB image. Used both as the render target (framebuffer) and as
/// the per-frame color source that texture coordinates address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl RgbImage {
    /// Create a zero-filled (black) image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width * height],
        }
    }

    /// Wrap existing row-major pixels. Fails if the count does not match the size.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, CommonError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(CommonError::ImageSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Zero-fill every pixel.
    pub fn clear(&mut self) {
        self.fill([0; 3]);
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row < self.height && col < self.width {
            Some(self.pixels[row * self.width + col])
        } else {
            None
        }
    }

    /// Write one pixel. Out-of-range writes are ignored and reported as `false`.
    pub fn set(&mut self, row: usize, col: usize, color: Rgb) -> bool {
        if row < self.height && col < self.width {
            self.pixels[row * self.width + col] = color;
            true
        } else {
            false
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    /// Raw interleaved `RGBRGB...` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Interleaved RGBA bytes with opaque alpha, for texture upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for [r, g, b] in &self.pixels {
            out.extend_from_slice(&[*r, *g, *b, 255]);
        }
        out
    }

    /// True when every pixel is black.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| *p == [0; 3])
    }

    /// Map a texture coordinate in `[0, 1]^2` to a `(row, col)` texel.
    ///
    /// Scales by the image size, rounds half up, then clamps to the image, so
    /// any input (including NaN or coordinates outside the unit square) lands
    /// on a valid texel. Returns `None` only for an empty image.
    pub fn texel_at(&self, uv: Vec2) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let col = clamp_index(uv.x * self.width as f32 + 0.5, self.width);
        let row = clamp_index(uv.y * self.height as f32 + 0.5, self.height);
        Some((row, col))
    }

    /// Color at a texture coordinate; black for an empty image.
    pub fn sample(&self, uv: Vec2) -> Rgb {
        match self.texel_at(uv) {
            Some((row, col)) => self.pixels[row * self.width + col],
            None => [0; 3],
        }
    }
}

/// Truncate toward zero, then clamp into `[0, len - 1]`. NaN maps to 0.
fn clamp_index(value: f32, len: usize) -> usize {
    let index = value as i64;
    index.clamp(0, len as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_black() {
        let img = RgbImage::new(4, 3);
        assert_eq!(img.pixels().len(), 12);
        assert!(img.is_blank());
    }

    #[test]
    fn from_pixels_checks_size() {
        let err = RgbImage::from_pixels(2, 2, vec![[1, 2, 3]; 3]).unwrap_err();
        assert!(matches!(err, CommonError::ImageSize { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn set_and_get_are_row_major() {
        let mut img = RgbImage::new(3, 2);
        assert!(img.set(1, 2, [9, 8, 7]));
        assert_eq!(img.get(1, 2), Some([9, 8, 7]));
        assert_eq!(img.pixels()[5], [9, 8, 7]);
        assert!(!img.set(2, 0, [1, 1, 1]));
        assert_eq!(img.get(0, 3), None);
    }

    #[test]
    fn clear_zero_fills() {
        let mut img = RgbImage::new(2, 2);
        img.fill([10, 20, 30]);
        assert!(!img.is_blank());
        img.clear();
        assert!(img.is_blank());
    }

    #[test]
    fn center_texcoord_maps_to_center_texel() {
        // 100 rows x 200 cols
        let img = RgbImage::new(200, 100);
        assert_eq!(img.texel_at(Vec2::new(0.5, 0.5)), Some((50, 100)));
    }

    #[test]
    fn texcoords_outside_unit_square_are_clamped() {
        let img = RgbImage::new(8, 4);
        assert_eq!(img.texel_at(Vec2::new(1.0, 1.0)), Some((3, 7)));
        assert_eq!(img.texel_at(Vec2::new(-3.0, 7.5)), Some((3, 0)));
        assert_eq!(img.texel_at(Vec2::new(f32::NAN, f32::INFINITY)), Some((3, 0)));
    }

    #[test]
    fn sampling_an_empty_image_is_black() {
        let img = RgbImage::new(0, 0);
        assert_eq!(img.texel_at(Vec2::splat(0.5)), None);
        assert_eq!(img.sample(Vec2::splat(0.5)), [0, 0, 0]);
    }

    #[test]
    fn byte_views_follow_pixel_order() {
        let img = RgbImage::from_pixels(2, 1, vec![[1, 2, 3], [4, 5, 6]]).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(img.to_rgba(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
