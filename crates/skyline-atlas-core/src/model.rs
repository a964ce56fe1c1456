use serde::{Deserialize, Serialize};

/// Placement of a rectangle inside the atlas canvas (pixels).
///
/// `x,y` is the top-left corner. A region is a coordinate descriptor only; it does
/// not own canvas memory and is invalidated by [`TextureAtlas::clear`](crate::atlas::TextureAtlas::clear).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
    /// Exclusive right edge (`x + width`).
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }
    /// Exclusive bottom edge (`y + height`).
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
    /// True if the two regions share at least one pixel.
    pub fn intersects(&self, other: &Region) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || self.x as u64 >= other.right()
            || other.x as u64 >= self.right()
            || self.y as u64 >= other.bottom()
            || other.y as u64 >= self.bottom())
    }
    /// True if the region lies fully inside a `width x height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }
}

/// Statistics about canvas usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    pub width: u32,
    pub height: u32,
    /// Number of regions allocated since construction or the last clear.
    pub num_regions: usize,
    /// Canvas area (`width * height`).
    pub total_area: u64,
    /// Sum of allocated region areas.
    pub used_area: u64,
    /// `used_area / total_area` (0.0 to 1.0).
    pub occupancy: f64,
    /// Number of skyline segments currently tracked.
    pub num_segments: usize,
    /// Highest point of the skyline.
    pub skyline_peak: u32,
}

impl AtlasStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Regions: {}, Occupancy: {:.2}%, Used Area: {} px², Skyline: {} segments (peak {})",
            self.width,
            self.height,
            self.num_regions,
            self.occupancy * 100.0,
            self.used_area,
            self.num_segments,
            self.skyline_peak,
        )
    }

    /// Returns unallocated space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_area.saturating_sub(self.used_area)
    }
}
