use crate::model::Region;

pub mod skyline;

pub use skyline::{Segment, SkylinePacker};

/// An allocator places rectangles into a fixed-size canvas.
///
/// Implementations must never return overlapping regions, and a failed `allocate`
/// must leave the free-space bookkeeping untouched. `None` is the normal "no room"
/// answer, both for requests larger than the canvas and for a full canvas.
pub trait Allocator {
    fn can_allocate(&self, w: u32, h: u32) -> bool;
    fn allocate(&mut self, w: u32, h: u32) -> Option<Region>;
    /// Forget every placement and start over with an empty canvas.
    fn reset(&mut self);
}
