use serde::{Deserialize, Serialize};

/// Canvas configuration for a [`TextureAtlas`](crate::atlas::TextureAtlas).
///
/// `depth` is the number of bytes per pixel (1 = alpha/luminance, 3 = RGB, 4 = RGBA).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasConfig {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            depth: default_depth(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns [`AtlasError::InvalidDimension`](crate::error::AtlasError::InvalidDimension) if:
    /// - width, height or depth is zero
    /// - the canvas byte size `width * height * depth` does not fit in memory addressing
    pub fn validate(&self) -> crate::error::Result<()> {
        self.buffer_len().map(|_| ())
    }

    /// Size in bytes of a canvas with this configuration.
    pub fn buffer_len(&self) -> crate::error::Result<usize> {
        use crate::error::AtlasError;

        let invalid = || AtlasError::InvalidDimension {
            width: self.width,
            height: self.height,
            depth: self.depth,
        };
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(invalid());
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(self.depth as usize))
            .ok_or_else(invalid)
    }

    /// Bytes per canvas row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.depth as usize
    }

    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

// Square power-of-two RGBA page; friendly to older drivers.
fn default_size() -> u32 {
    512
}

fn default_depth() -> u32 {
    4
}

#[derive(Debug, Clone, Default)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn depth(mut self, v: u32) -> Self {
        self.cfg.depth = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
