use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyline_atlas_core::prelude::*;

fn random_requests(seed: u64, count: usize, min: u32, max: u32) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (rng.gen_range(min..=max), rng.gen_range(min..=max)))
        .collect()
}

fn disjoint(regions: &[Region]) -> bool {
    for i in 0..regions.len() {
        for j in (i + 1)..regions.len() {
            if regions[i].intersects(&regions[j]) {
                return false;
            }
        }
    }
    true
}

fn check_skyline(atlas: &TextureAtlas) {
    let segs = atlas.skyline();
    assert!(!segs.is_empty());
    assert_eq!(segs[0].x, 0);
    let total: u64 = segs.iter().map(|s| s.width as u64).sum();
    assert_eq!(total, atlas.width() as u64, "segment widths must cover the canvas");
    for pair in segs.windows(2) {
        assert_eq!(pair[0].x + pair[0].width, pair[1].x, "segments must be contiguous");
        assert_ne!(pair[0].y, pair[1].y, "equal neighbours must be merged");
    }
    for s in segs {
        assert!(s.width > 0);
        assert!(s.y <= atlas.height());
    }
}

fn skyline_height_at(atlas: &TextureAtlas, x: u32) -> u32 {
    atlas
        .skyline()
        .iter()
        .find(|s| s.x <= x && x < s.x + s.width)
        .map(|s| s.y)
        .expect("every column is covered")
}

#[test]
fn random_sequences_keep_invariants() {
    for seed in [1u64, 7, 42, 1_000_000_000] {
        let mut atlas = TextureAtlas::with_size(256, 256, 1).expect("atlas");
        for (w, h) in random_requests(seed, 400, 1, 40) {
            let before = atlas.skyline().to_vec();
            match atlas.allocate(w, h).unwrap() {
                Some(r) => {
                    assert_eq!((r.width, r.height), (w, h));
                    assert!(r.fits_within(256, 256));
                    for x in r.x..r.x + r.width {
                        assert_eq!(skyline_height_at(&atlas, x) as u64, r.bottom());
                    }
                }
                None => assert_eq!(atlas.skyline(), before.as_slice()),
            }
            check_skyline(&atlas);
        }
        assert!(disjoint(atlas.regions()), "seed {seed} produced overlaps");
        assert!(atlas.stats().occupancy > 0.5);
    }
}

#[test]
fn same_requests_give_same_regions() {
    let requests = random_requests(1_000_000_000, 512, 10, 29);
    let run = || {
        let mut atlas = TextureAtlas::with_size(512, 512, 4).expect("atlas");
        requests
            .iter()
            .map(|&(w, h)| atlas.allocate(w, h).unwrap())
            .collect::<Vec<_>>()
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert!(a.iter().any(Option::is_some));
}

#[test]
fn squares_fill_the_canvas_until_exhausted() {
    let mut atlas = TextureAtlas::with_size(64, 64, 4).expect("atlas");
    let mut placed = 0;
    while let Some(r) = atlas.allocate(16, 16).unwrap() {
        assert_eq!(r.x % 16, 0);
        assert_eq!(r.y % 16, 0);
        placed += 1;
    }
    assert_eq!(placed, 16);
    let stats = atlas.stats();
    assert_eq!(stats.used_area, stats.total_area);
    assert_eq!(stats.wasted_area(), 0);
    assert_eq!(stats.skyline_peak, 64);
    assert_eq!(stats.num_segments, 1);
}
