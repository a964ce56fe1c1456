use crate::error::{AtlasError, Result};
use crate::model::Region;

/// Read-only view of a committed canvas: `width * height * depth` bytes, row-major.
#[derive(Debug, Clone, Copy)]
pub struct CanvasView<'a> {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub pixels: &'a [u8],
}

impl<'a> CanvasView<'a> {
    /// Bytes per canvas row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.depth as usize
    }

    /// Bytes of canvas row `y`.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.row_stride();
        let start = y as usize * stride;
        self.pixels.get(start..start + stride)
    }

    /// Copies the pixels of `region` out of the canvas, tightly packed
    /// (`region.width * depth` bytes per row).
    pub fn region_bytes(&self, region: &Region) -> Result<Vec<u8>> {
        if !region.fits_within(self.width, self.height) {
            return Err(AtlasError::OutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }
        let depth = self.depth as usize;
        let row_len = region.width as usize * depth;
        let mut out = Vec::with_capacity(row_len * region.height as usize);
        for y in region.y..region.y + region.height {
            let start = y as usize * self.row_stride() + region.x as usize * depth;
            out.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        Ok(out)
    }
}

#[cfg(feature = "image")]
impl CanvasView<'_> {
    /// Convert to an image. Depths 1 (L8), 2 (LA8), 3 (RGB8) and 4 (RGBA8) are supported.
    pub fn to_image(&self) -> Result<image::DynamicImage> {
        use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

        let (w, h) = (self.width, self.height);
        let buf = self.pixels.to_vec();
        let malformed =
            || AtlasError::InvalidInput("canvas buffer does not match its dimensions".into());
        let img = match self.depth {
            1 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, buf).ok_or_else(malformed)?),
            2 => DynamicImage::ImageLumaA8(
                GrayAlphaImage::from_raw(w, h, buf).ok_or_else(malformed)?,
            ),
            3 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, buf).ok_or_else(malformed)?),
            4 => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, buf).ok_or_else(malformed)?),
            d => return Err(AtlasError::UnsupportedDepth(d)),
        };
        Ok(img)
    }
}

/// Consumer of committed canvases, typically a GPU texture upload.
///
/// [`TextureAtlas::commit_to`](crate::atlas::TextureAtlas::commit_to) calls `upload`
/// exactly once per commit with the full buffer and its dimensions.
pub trait TextureTarget {
    fn upload(&mut self, view: &CanvasView<'_>) -> Result<()>;
}

impl<F> TextureTarget for F
where
    F: FnMut(&CanvasView<'_>) -> Result<()>,
{
    fn upload(&mut self, view: &CanvasView<'_>) -> Result<()> {
        self(view)
    }
}
