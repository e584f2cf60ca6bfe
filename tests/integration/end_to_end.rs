//! Detect → extract → write, against real files on disk

use super::test_utils::write_image;
use bamboo::detect::Detection;
use bamboo::frame::{Frame, HistoryStep, EXTRACT, FACE};
use bamboo::pipeline::Pipeline;
use bamboo::stage::face::EXTRACT_COUNT;
use bamboo::stage::{
    DetectFaces, ExtractFaces, HtmlGallery, WriteFrameMetadata, WriteFramesToDirectory,
};
use bamboo::storage::Location;
use bamboo::types::Region;
use image::DynamicImage;
use tempfile::TempDir;

fn boxes() -> Vec<Region> {
    vec![Region::new((10, 20), 40, 50), Region::new((100, 30), 60, 70)]
}

fn two_faces(_image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
    Ok(boxes()
        .into_iter()
        .map(|region| Detection::new(region, 0.99))
        .collect())
}

#[test]
fn test_detect_extract_save() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "group.png", 200, 150);
    let out = temp_dir.path().join("faces");

    let mut pipeline = Pipeline::new();
    let (first, last) = pipeline
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(two_faces)),
            Box::new(ExtractFaces::default()),
            Box::new(WriteFramesToDirectory::new(out.as_path())),
        ])
        .unwrap();

    pipeline.run(|p| p.process(Frame::at(source.as_path()))).unwrap();

    let counts: Vec<u64> = pipeline.stats().iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![1, 1, 2]);
    assert_eq!(pipeline.stage_name(first).unwrap(), "DetectFaces");
    assert_eq!(pipeline.stage_name(last).unwrap(), "WriteFramesToDirectory");
    assert!(pipeline.failures().is_empty());

    for (index, region) in boxes().iter().enumerate() {
        let written = out.join(format!("{:08}.jpg", index));
        let decoded = image::open(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (region.width, region.height));
    }
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
}

#[test]
fn test_crops_carry_provenance_and_tags() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "group.png", 200, 150);
    let out = temp_dir.path().join("faces");
    let meta = temp_dir.path().join("meta");

    let mut pipeline = Pipeline::new();
    pipeline
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(two_faces)),
            Box::new(ExtractFaces::default()),
            Box::new(WriteFramesToDirectory::new(out.as_path())),
            Box::new(WriteFrameMetadata::in_directory(meta.as_path())),
        ])
        .unwrap();
    pipeline.run(|p| p.process(Frame::at(source.as_path()))).unwrap();

    let document = std::fs::read(meta.join("1.json")).unwrap();
    let restored = Frame::from_structured(serde_json::from_slice(&document).unwrap()).unwrap();

    assert_eq!(
        restored.history(),
        &[
            HistoryStep::Loaded(Location::from_path(&source)),
            HistoryStep::Cropped(boxes()[1]),
            HistoryStep::Loaded(Location::from_path(out.join("00000001.jpg"))),
        ]
    );
    assert_eq!(restored.first_tag(FACE).unwrap().region(), Some(&boxes()[1]));
    assert_eq!(
        restored.first_tag(EXTRACT).unwrap().get(EXTRACT_COUNT).and_then(|v| v.as_i64()),
        Some(2)
    );
}

#[test]
fn test_scaled_extraction_is_clamped() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "edge.png", 100, 100);
    let out = temp_dir.path().join("faces");

    let edge = |_: &DynamicImage| -> anyhow::Result<Vec<Detection>> {
        Ok(vec![Detection::new(Region::new((0, 0), 20, 20), 0.9)])
    };
    let mut pipeline = Pipeline::new();
    pipeline
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(edge)),
            Box::new(ExtractFaces::new(2.0)),
            Box::new(
                WriteFramesToDirectory::new(out.as_path()).with_template("face-{counter}.png"),
            ),
        ])
        .unwrap();
    pipeline.run(|p| p.process(Frame::at(source.as_path()))).unwrap();

    let decoded = image::open(out.join("face-0.png")).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (30, 30));
}

#[test]
fn test_gallery_written_at_shutdown() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "group.png", 200, 150);
    let out = temp_dir.path().join("faces");
    let gallery = temp_dir.path().join("gallery.html");

    let mut pipeline = Pipeline::new();
    pipeline
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(two_faces)),
            Box::new(ExtractFaces::default()),
            Box::new(WriteFramesToDirectory::new(out.as_path())),
            Box::new(HtmlGallery::new(gallery.as_path(), |_| Some("faces".to_string()))),
        ])
        .unwrap();

    pipeline.start().unwrap();
    pipeline.process(Frame::at(source.as_path())).unwrap();
    assert!(!gallery.exists());
    pipeline.stop().unwrap();

    let html = std::fs::read_to_string(&gallery).unwrap();
    assert!(html.contains("<h2>faces:</h2>"));
    assert_eq!(html.matches("class='Image'").count(), 2);
    assert!(html.contains(&format!("href='{}'", source.display())));
}
