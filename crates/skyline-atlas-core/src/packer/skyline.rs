use super::Allocator;
use crate::model::Region;
use serde::{Deserialize, Serialize};

/// One run of the skyline: columns `[x, x + width)` are free from height `y` downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

impl Segment {
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// Skyline bottom-left allocator.
///
/// The skyline is kept as a run-length list sorted by `x` that always covers
/// `[0, width)` exactly; neighbouring segments never share a height after an
/// allocation.
#[derive(Clone, Debug)]
pub struct SkylinePacker {
    width: u32,
    height: u32,
    segments: Vec<Segment>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            segments: vec![Segment {
                x: 0,
                y: 0,
                width,
            }],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Highest point of the skyline.
    pub fn peak(&self) -> u32 {
        self.segments.iter().map(|s| s.y).max().unwrap_or(0)
    }

    /// Height at which a `w x h` rectangle would rest if its left edge is placed at
    /// the start of segment `i`, or `None` if it would leave the canvas.
    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<u32> {
        let x = self.segments[i].x;
        if x as u64 + w as u64 > self.width as u64 {
            return None;
        }
        let mut y = 0;
        let mut width_left = w;
        loop {
            y = y.max(self.segments[i].y);
            if y as u64 + h as u64 > self.height as u64 {
                return None;
            }
            if self.segments[i].width >= width_left {
                return Some(y);
            }
            width_left -= self.segments[i].width;
            i += 1;
            if i >= self.segments.len() {
                return None;
            }
        }
    }

    fn find_bottom_left(&self, w: u32, h: u32) -> Option<(usize, Region)> {
        let mut best: Option<(usize, Region)> = None;
        for i in 0..self.segments.len() {
            if let Some(y) = self.can_put(i, w, h) {
                // Strictly lower wins; on a tie the earlier (leftmost) candidate stays.
                if best.is_none_or(|(_, r)| y < r.y) {
                    best = Some((i, Region::new(self.segments[i].x, y, w, h)));
                }
            }
        }
        best
    }

    fn split(&mut self, index: usize, region: &Region) {
        let skyline = Segment {
            x: region.x,
            y: region.y + region.height,
            width: region.width,
        };
        debug_assert!(skyline.right() <= self.width);
        debug_assert!(skyline.y <= self.height);

        self.segments.insert(index, skyline);

        // Shrink or drop the segments now hidden under the new one.
        let i = index + 1;
        while i < self.segments.len() {
            let covered = skyline.right();
            if self.segments[i].x >= covered {
                break;
            }
            let shrink = covered - self.segments[i].x;
            if self.segments[i].width <= shrink {
                self.segments.remove(i);
            } else {
                self.segments[i].x += shrink;
                self.segments[i].width -= shrink;
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.segments.len() {
            if self.segments[i - 1].y == self.segments[i].y {
                let w = self.segments[i].width;
                self.segments[i - 1].width += w;
                self.segments.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl Allocator for SkylinePacker {
    fn can_allocate(&self, w: u32, h: u32) -> bool {
        w > 0 && h > 0 && w <= self.width && h <= self.height && self.find_bottom_left(w, h).is_some()
    }

    fn allocate(&mut self, w: u32, h: u32) -> Option<Region> {
        if w == 0 || h == 0 || w > self.width || h > self.height {
            return None;
        }
        let (i, region) = self.find_bottom_left(w, h)?;
        self.split(i, &region);
        self.merge();
        Some(region)
    }

    fn reset(&mut self) {
        self.segments.clear();
        self.segments.push(Segment {
            x: 0,
            y: 0,
            width: self.width,
        });
    }
}
