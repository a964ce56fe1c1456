use crate::atlas::TextureAtlas;
use crate::error::{AtlasError, Result};
use crate::model::Region;
use serde_json::{json, Value};

/// Map a region to normalized texture coordinates `[u0, v0, u1, v1]` on a
/// `width x height` canvas.
pub fn normalized(region: &Region, width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    [
        region.x as f32 / w,
        region.y as f32 / h,
        region.right() as f32 / w,
        region.bottom() as f32 / h,
    ]
}

/// Serialize atlas metadata as `{ meta, regions: [...] }`.
///
/// `names` pairs a caller-chosen key with each region; regions are written in the
/// given order with pixel and normalized coordinates. A released atlas has no
/// canvas to describe and yields [`AtlasError::UseAfterRelease`].
pub fn to_json<K: ToString>(atlas: &TextureAtlas, names: &[(K, Region)]) -> Result<Value> {
    if atlas.is_released() {
        return Err(AtlasError::UseAfterRelease);
    }
    let (w, h) = (atlas.width(), atlas.height());
    let regions: Vec<Value> = names
        .iter()
        .map(|(key, r)| {
            let [u0, v0, u1, v1] = normalized(r, w, h);
            json!({
                "key": key.to_string(),
                "frame": {"x": r.x, "y": r.y, "w": r.width, "h": r.height},
                "uv": {"u0": u0, "v0": v0, "u1": u1, "v1": v1},
            })
        })
        .collect();
    Ok(json!({
        "meta": {
            "app": "skyline-atlas",
            "version": env!("CARGO_PKG_VERSION"),
            "size": {"w": w, "h": h},
            "depth": atlas.depth(),
            "stats": atlas.stats(),
        },
        "regions": regions,
    }))
}
