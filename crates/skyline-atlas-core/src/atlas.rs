use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::model::{AtlasStats, Region};
use crate::packer::{Allocator, Segment, SkylinePacker};
use crate::target::{CanvasView, TextureTarget};
use tracing::{debug, instrument, trace};

/// Pixel storage owned by an active atlas.
struct Canvas {
    pixels: Vec<u8>,
    dirty: bool,
}

/// Fixed-size texture atlas.
///
/// Rectangles are placed with the Skyline bottom-left rule, pixel data is copied into
/// the returned regions with [`set`](Self::set), and [`commit`](Self::commit) exposes the
/// assembled buffer for upload. After [`release`](Self::release) every operation that
/// touches the canvas fails with [`AtlasError::UseAfterRelease`].
pub struct TextureAtlas {
    cfg: AtlasConfig,
    packer: SkylinePacker,
    canvas: Option<Canvas>,
    regions: Vec<Region>,
}

impl TextureAtlas {
    /// Create a zero-filled atlas. Fails with [`AtlasError::InvalidDimension`] when any
    /// dimension is zero or the buffer size overflows.
    pub fn new(cfg: AtlasConfig) -> Result<Self> {
        let len = cfg.buffer_len()?;
        debug!(
            width = cfg.width,
            height = cfg.height,
            depth = cfg.depth,
            "texture atlas created"
        );
        Ok(Self {
            packer: SkylinePacker::new(cfg.width, cfg.height),
            canvas: Some(Canvas {
                pixels: vec![0; len],
                dirty: false,
            }),
            regions: Vec::new(),
            cfg,
        })
    }

    pub fn with_size(width: u32, height: u32, depth: u32) -> Result<Self> {
        Self::new(AtlasConfig {
            width,
            height,
            depth,
        })
    }

    pub fn width(&self) -> u32 {
        self.cfg.width
    }

    pub fn height(&self) -> u32 {
        self.cfg.height
    }

    /// Bytes per pixel.
    pub fn depth(&self) -> u32 {
        self.cfg.depth
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.cfg
    }

    /// True when pixel data changed since the last commit.
    pub fn is_dirty(&self) -> bool {
        self.canvas.as_ref().is_some_and(|c| c.dirty)
    }

    pub fn is_released(&self) -> bool {
        self.canvas.is_none()
    }

    /// Regions allocated since construction or the last [`clear`](Self::clear), in order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn skyline(&self) -> &[Segment] {
        self.packer.segments()
    }

    /// Reserve a `w x h` rectangle.
    ///
    /// `Ok(None)` means there is no room: the request exceeds the canvas or the canvas is
    /// full. The skyline is left unchanged in that case.
    pub fn allocate(&mut self, w: u32, h: u32) -> Result<Option<Region>> {
        if self.canvas.is_none() {
            return Err(AtlasError::UseAfterRelease);
        }
        match self.packer.allocate(w, h) {
            Some(region) => {
                trace!(?region, "allocated");
                self.regions.push(region);
                Ok(Some(region))
            }
            None => {
                debug!(w, h, "no room in atlas");
                Ok(None)
            }
        }
    }

    /// Copy `pixels` into `region`.
    ///
    /// `pixels` is row-major with `row_stride` bytes per row; each row contributes
    /// `region.width * depth` bytes. Nothing is written unless every check passes.
    pub fn set(&mut self, region: &Region, pixels: &[u8], row_stride: usize) -> Result<()> {
        let depth = self.cfg.depth as usize;
        let dst_stride = self.cfg.row_stride();
        let canvas = self.canvas.as_mut().ok_or(AtlasError::UseAfterRelease)?;

        if !region.fits_within(self.cfg.width, self.cfg.height) {
            return Err(AtlasError::OutOfBounds {
                region: *region,
                width: self.cfg.width,
                height: self.cfg.height,
            });
        }
        if region.is_empty() {
            return Ok(());
        }

        let row_len = region.width as usize * depth;
        if row_stride < row_len {
            return Err(AtlasError::InvalidInput(format!(
                "row stride {} is shorter than a region row of {} bytes",
                row_stride, row_len
            )));
        }
        let needed = row_stride
            .checked_mul(region.height as usize - 1)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| {
                AtlasError::InvalidInput(format!(
                    "row stride {} overflows for a region {} rows tall",
                    row_stride, region.height
                ))
            })?;
        if pixels.len() < needed {
            return Err(AtlasError::InvalidInput(format!(
                "pixel data holds {} bytes, region {}x{} needs {}",
                pixels.len(),
                region.width,
                region.height,
                needed
            )));
        }

        for row in 0..region.height as usize {
            let src = row * row_stride;
            let dst = (region.y as usize + row) * dst_stride + region.x as usize * depth;
            canvas.pixels[dst..dst + row_len].copy_from_slice(&pixels[src..src + row_len]);
        }
        canvas.dirty = true;
        Ok(())
    }

    /// Expose the full canvas and clear the dirty flag. May be called repeatedly; each
    /// call reflects the current contents.
    pub fn commit(&mut self) -> Result<CanvasView<'_>> {
        let canvas = self.canvas.as_mut().ok_or(AtlasError::UseAfterRelease)?;
        canvas.dirty = false;
        Ok(CanvasView {
            width: self.cfg.width,
            height: self.cfg.height,
            depth: self.cfg.depth,
            pixels: &canvas.pixels,
        })
    }

    /// Commit and hand the canvas to `target`, which is invoked exactly once.
    #[instrument(skip_all, fields(width = self.cfg.width, height = self.cfg.height))]
    pub fn commit_to<T: TextureTarget + ?Sized>(&mut self, target: &mut T) -> Result<CanvasView<'_>> {
        let view = self.commit()?;
        target.upload(&view)?;
        debug!("canvas committed to target");
        Ok(view)
    }

    /// Read-only access to the canvas bytes without touching the dirty flag.
    pub fn pixels(&self) -> Result<&[u8]> {
        self.canvas
            .as_ref()
            .map(|c| c.pixels.as_slice())
            .ok_or(AtlasError::UseAfterRelease)
    }

    /// Current canvas contents, without committing.
    pub fn view(&self) -> Result<CanvasView<'_>> {
        Ok(CanvasView {
            width: self.cfg.width,
            height: self.cfg.height,
            depth: self.cfg.depth,
            pixels: self.pixels()?,
        })
    }

    /// Drop every allocation and zero the canvas. Previously returned regions are
    /// superseded and must not be passed to [`set`](Self::set) again.
    pub fn clear(&mut self) -> Result<()> {
        let canvas = self.canvas.as_mut().ok_or(AtlasError::UseAfterRelease)?;
        canvas.pixels.fill(0);
        canvas.dirty = true;
        self.packer.reset();
        self.regions.clear();
        debug!("texture atlas cleared");
        Ok(())
    }

    /// Free the canvas buffer. Terminal; releasing twice is a no-op.
    pub fn release(&mut self) {
        if self.canvas.take().is_some() {
            self.regions.clear();
            debug!("texture atlas released");
        }
    }

    pub fn stats(&self) -> AtlasStats {
        let total_area = self.cfg.width as u64 * self.cfg.height as u64;
        let used_area: u64 = self.regions.iter().map(Region::area).sum();
        AtlasStats {
            width: self.cfg.width,
            height: self.cfg.height,
            num_regions: self.regions.len(),
            total_area,
            used_area,
            occupancy: if total_area > 0 {
                used_area as f64 / total_area as f64
            } else {
                0.0
            },
            num_segments: self.packer.segments().len(),
            skyline_peak: self.packer.peak(),
        }
    }
}

#[cfg(feature = "image")]
impl TextureAtlas {
    /// Convert the canvas to an image without committing it.
    pub fn to_image(&self) -> Result<image::DynamicImage> {
        self.view()?.to_image()
    }

    /// Save the canvas as a PNG file.
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let img = self.to_image()?;
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = std::io::BufWriter::new(file);
        img.write_to(&mut writer, image::ImageFormat::Png)?;
        debug!(path = %path.as_ref().display(), "texture atlas saved");
        Ok(())
    }
}
