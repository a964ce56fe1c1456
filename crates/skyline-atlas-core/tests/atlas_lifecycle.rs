use skyline_atlas_core::prelude::*;

#[derive(Default)]
struct RecordingTarget {
    uploads: Vec<(u32, u32, u32, Vec<u8>)>,
}

impl TextureTarget for RecordingTarget {
    fn upload(&mut self, view: &CanvasView<'_>) -> Result<()> {
        self.uploads
            .push((view.width, view.height, view.depth, view.pixels.to_vec()));
        Ok(())
    }
}

struct FailingTarget;

impl TextureTarget for FailingTarget {
    fn upload(&mut self, _view: &CanvasView<'_>) -> Result<()> {
        Err(AtlasError::Upload("device lost".into()))
    }
}

#[test]
fn zero_dimensions_are_rejected() {
    for (w, h, d) in [(0, 16, 4), (16, 0, 4), (16, 16, 0), (0, 0, 0)] {
        let err = TextureAtlas::with_size(w, h, d).err().expect("must fail");
        assert!(matches!(err, AtlasError::InvalidDimension { .. }));
    }
    let cfg = AtlasConfig::builder().with_dimensions(0, 8).build();
    assert!(cfg.validate().is_err());
    assert!(AtlasConfig::default().validate().is_ok());
}

#[test]
fn overflowing_buffer_size_is_rejected() {
    let err = TextureAtlas::with_size(u32::MAX, u32::MAX, 4).err().expect("must fail");
    assert!(matches!(err, AtlasError::InvalidDimension { .. }));
}

#[test]
fn default_config_is_square_rgba() {
    let atlas = TextureAtlas::new(AtlasConfig::default()).expect("atlas");
    assert_eq!((atlas.width(), atlas.height(), atlas.depth()), (512, 512, 4));
    assert_eq!(atlas.pixels().unwrap().len(), 512 * 512 * 4);
    assert!(atlas.pixels().unwrap().iter().all(|&b| b == 0));
    assert!(!atlas.is_dirty());
}

#[test]
fn commit_to_uploads_exactly_once() {
    let mut atlas = TextureAtlas::with_size(4, 2, 1).expect("atlas");
    let r = atlas.allocate(2, 2).unwrap().expect("fits");
    atlas.set(&r, &[1, 2, 3, 4], 2).expect("set");

    let mut target = RecordingTarget::default();
    atlas.commit_to(&mut target).expect("commit");
    assert_eq!(target.uploads.len(), 1);
    let (w, h, d, px) = &target.uploads[0];
    assert_eq!((*w, *h, *d), (4, 2, 1));
    assert_eq!(px, &vec![1, 2, 0, 0, 3, 4, 0, 0]);
    assert!(!atlas.is_dirty());

    atlas.commit_to(&mut target).expect("commit again");
    assert_eq!(target.uploads.len(), 2);
}

#[test]
fn upload_errors_are_surfaced() {
    let mut atlas = TextureAtlas::with_size(4, 4, 1).expect("atlas");
    let err = atlas.commit_to(&mut FailingTarget).err().expect("must fail");
    assert!(matches!(err, AtlasError::Upload(_)));
}

#[test]
fn clear_resets_skyline_and_pixels() {
    let mut atlas = TextureAtlas::with_size(16, 16, 1).expect("atlas");
    let r = atlas.allocate(16, 16).unwrap().expect("fits");
    atlas.set(&r, &[0xAA; 256], 16).expect("set");
    atlas.commit().expect("commit");
    assert_eq!(atlas.allocate(1, 1).unwrap(), None);

    atlas.clear().expect("clear");
    assert!(atlas.is_dirty());
    assert!(atlas.regions().is_empty());
    assert_eq!(atlas.skyline(), &[Segment { x: 0, y: 0, width: 16 }]);
    assert!(atlas.pixels().unwrap().iter().all(|&b| b == 0));
    assert_eq!(atlas.allocate(16, 16).unwrap(), Some(r));
}

#[test]
fn every_operation_after_release_fails() {
    let mut atlas = TextureAtlas::with_size(32, 32, 4).expect("atlas");
    let r = atlas.allocate(8, 8).unwrap().expect("fits");
    atlas.release();
    assert!(atlas.is_released());

    assert!(matches!(atlas.allocate(1, 1), Err(AtlasError::UseAfterRelease)));
    assert!(matches!(
        atlas.set(&r, &[0u8; 8 * 8 * 4], 8 * 4),
        Err(AtlasError::UseAfterRelease)
    ));
    assert!(matches!(atlas.commit(), Err(AtlasError::UseAfterRelease)));
    let mut target = RecordingTarget::default();
    assert!(matches!(
        atlas.commit_to(&mut target),
        Err(AtlasError::UseAfterRelease)
    ));
    assert!(target.uploads.is_empty());
    assert!(matches!(atlas.clear(), Err(AtlasError::UseAfterRelease)));
    assert!(matches!(atlas.pixels(), Err(AtlasError::UseAfterRelease)));
    assert!(matches!(
        skyline_atlas_core::export::to_json(&atlas, &[("r", r)]),
        Err(AtlasError::UseAfterRelease)
    ));

    // Releasing again changes nothing.
    atlas.release();
    assert!(matches!(atlas.commit(), Err(AtlasError::UseAfterRelease)));
    assert!(!atlas.is_dirty());
}

#[test]
fn release_is_reported_before_bounds() {
    let mut atlas = TextureAtlas::with_size(8, 8, 1).expect("atlas");
    atlas.release();
    let foreign = Region::new(100, 100, 4, 4);
    assert!(matches!(
        atlas.set(&foreign, &[0u8; 16], 4),
        Err(AtlasError::UseAfterRelease)
    ));
}
