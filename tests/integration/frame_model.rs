//! Frame behaviour against files and a shared cache

use super::test_utils::{test_image, write_image};
use bamboo::cache::ImageCache;
use bamboo::frame::{Frame, HistoryStep, Tag, DEFAULT_JPEG_QUALITY};
use bamboo::hasher::content_hash;
use bamboo::storage::Location;
use bamboo::types::Region;
use tempfile::TempDir;

#[test]
fn test_copies_share_pixels_until_tagged() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_image(temp_dir.path(), "a.png", 32, 24);
    let cache = ImageCache::default();

    let original = Frame::open(path.as_path(), &cache).unwrap();
    let mut copy = original.copy();
    copy.add_tag(Tag::new("face").with_label("bob"));

    assert!(original.tags().is_empty());
    assert_eq!(copy.tags().len(), 1);
    assert_eq!(original.location(), copy.location());
    assert_eq!(cache.stats().images.misses, 1);
}

#[test]
fn test_crop_of_file_backed_frame() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_image(temp_dir.path(), "a.png", 100, 80);
    let cache = ImageCache::default();
    let frame = Frame::at(path.as_path()).with_tag(Tag::new("scene"));

    let region = Region::new((10, 5), 40, 30);
    let crop = frame.crop(region, &cache).unwrap();

    assert_eq!(crop.location(), None);
    assert_eq!((crop.width(&cache).unwrap(), crop.height(&cache).unwrap()), (40, 30));
    assert_eq!(crop.history().last(), Some(&HistoryStep::Cropped(region)));
    assert!(crop.tags().is_empty());
    assert_eq!(crop.created_at(), frame.created_at());

    let expected = test_image(100, 80, 0).crop_imm(10, 5, 40, 30).to_rgb8();
    assert_eq!(crop.image(&cache).unwrap().to_rgb8(), expected);
}

#[test]
fn test_save_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ImageCache::default();
    let mut frame = Frame::from_image(test_image(20, 20, 3));
    let destination = Location::from_path(temp_dir.path().join("nested/out.png"));

    frame.save(&destination, &cache, DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(frame.location(), Some(&destination));
    assert_eq!(frame.mime_type(), Some("image/png"));

    let stored = std::fs::read(temp_dir.path().join("nested/out.png")).unwrap();
    let reopened = Frame::open(destination.clone(), &cache).unwrap();
    assert_eq!(reopened.hash(&cache).unwrap(), content_hash(&stored));
    assert_eq!(
        reopened.image(&cache).unwrap().to_rgb8(),
        test_image(20, 20, 3).to_rgb8()
    );
}

#[test]
fn test_similarity_between_files() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ImageCache::default();
    let a = Frame::at(write_image(temp_dir.path(), "a.png", 24, 24).as_path());
    let b = Frame::at(write_image(temp_dir.path(), "b.png", 24, 24).as_path());
    let small = Frame::at(write_image(temp_dir.path(), "c.png", 12, 24).as_path());

    assert!((a.similarity(Some(&b), &cache).unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(a.similarity(Some(&small), &cache).unwrap(), 0.0);
    assert_eq!(a.similarity(None, &cache).unwrap(), 0.0);
}

#[test]
fn test_structured_document_survives_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let frame = Frame::at("/photos/2022-12-31T23:59:59.jpg")
        .with_tag(Tag::new("face").with_region(Region::new((1, 2), 3, 4)))
        .with_dimensions(640, 480, 3);

    let path = temp_dir.path().join("frame.json");
    std::fs::write(&path, serde_json::to_vec(&frame.to_structured().unwrap()).unwrap()).unwrap();
    let restored =
        Frame::from_structured(serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap())
            .unwrap();

    assert_eq!(restored, frame);
}
