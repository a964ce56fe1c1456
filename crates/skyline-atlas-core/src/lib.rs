//! Fixed-size texture atlas built on the Skyline bottom-left packing rule.
//!
//! - Allocation: `TextureAtlas::allocate` returns a `Region` or `None` when there is no room
//! - Pixels: `TextureAtlas::set` copies row-major data (any row stride) into a region
//! - Upload: `TextureAtlas::commit_to` hands the whole canvas to a `TextureTarget`
//!
//! Quick example:
//! ```
//! use skyline_atlas_core::prelude::*;
//! # fn main() -> skyline_atlas_core::Result<()> {
//! let mut atlas = TextureAtlas::with_size(512, 512, 4)?;
//! if let Some(region) = atlas.allocate(20, 20)? {
//!     let pixels = vec![255u8; 20 * 20 * 4];
//!     atlas.set(&region, &pixels, 20 * 4)?;
//! }
//! let mut uploads = 0;
//! atlas.commit_to(&mut |view: &CanvasView<'_>| -> Result<()> {
//!     assert_eq!(view.pixels.len(), 512 * 512 * 4);
//!     uploads += 1;
//!     Ok(())
//! })?;
//! assert_eq!(uploads, 1);
//! atlas.release();
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod target;

pub use atlas::*;
pub use config::*;
pub use error::*;
pub use model::*;
pub use packer::*;
pub use target::*;

/// Convenience prelude for common types and functions.
/// Importing `skyline_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::TextureAtlas;
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder};
    pub use crate::error::{AtlasError, Result};
    pub use crate::model::{AtlasStats, Region};
    pub use crate::packer::{Allocator, Segment, SkylinePacker};
    pub use crate::target::{CanvasView, TextureTarget};
}
