//! Tags written by one run and read back by another

use super::test_utils::{write_image, Recorder};
use bamboo::detect::{Detection, CONFIDENCE};
use bamboo::exchange::{read_tag_directory, TAG_FILE_SUFFIX};
use bamboo::frame::{Frame, FACE};
use bamboo::pipeline::Pipeline;
use bamboo::source::frames_from_tag_directory;
use bamboo::stage::{DetectFaces, ExtractFaces, WriteFramesToDirectory, WriteTagsToDirectory};
use bamboo::storage::Location;
use bamboo::types::Region;
use image::DynamicImage;
use tempfile::TempDir;

fn detector(_image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
    Ok(vec![
        Detection::new(Region::new((5, 5), 20, 24), 0.8),
        Detection::new(Region::new((40, 10), 16, 16), 0.6),
    ])
}

#[test]
fn test_detections_round_trip_through_tag_directory() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "2023-05-06T07:08:09.png", 80, 60);
    let tags_dir = temp_dir.path().join("tags");

    let mut detect = Pipeline::new();
    detect
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(detector)),
            Box::new(WriteTagsToDirectory::of_kind(tags_dir.as_path(), FACE)),
        ])
        .unwrap();
    detect.run(|p| p.process(Frame::at(source.as_path()))).unwrap();

    let files: Vec<_> = std::fs::read_dir(&tags_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|name| name.ends_with(TAG_FILE_SUFFIX)));

    let records = read_tag_directory(&tags_dir).unwrap();
    assert!(records
        .iter()
        .all(|r| r.frame.location == Some(Location::from_path(&source))));
    let mut confidences: Vec<f64> = records
        .iter()
        .filter_map(|r| r.tag.get(CONFIDENCE).and_then(|v| v.as_f64()))
        .collect();
    confidences.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(confidences, vec![0.6, 0.8]);

    // a second run crops the faces named in the exchange directory
    let out = temp_dir.path().join("crops");
    let mut extract = Pipeline::new();
    extract
        .add_linear_pipeline(vec![
            Box::new(ExtractFaces::default()),
            Box::new(WriteFramesToDirectory::new(out.as_path()).sharded("png")),
        ])
        .unwrap();
    let submitted = extract
        .run(|p| p.process_stream(frames_from_tag_directory(&tags_dir).unwrap()))
        .unwrap();
    assert_eq!(submitted, 2);

    let mut sizes: Vec<(u32, u32)> = walkdir::WalkDir::new(&out)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let decoded = image::open(e.path()).unwrap();
            (decoded.width(), decoded.height())
        })
        .collect();
    sizes.sort();
    assert_eq!(sizes, vec![(16, 16), (20, 24)]);
}

#[test]
fn test_restored_frames_keep_created_at() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "2023-05-06T07:08:09.png", 40, 40);
    let frame = Frame::at(source.as_path());
    let tags_dir = temp_dir.path().join("tags");

    let mut pipeline = Pipeline::new();
    pipeline
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(detector)),
            Box::new(WriteTagsToDirectory::new(tags_dir.as_path())),
        ])
        .unwrap();
    pipeline.run(|p| p.process(frame.clone())).unwrap();

    for restored in frames_from_tag_directory(&tags_dir).unwrap() {
        let restored = restored.unwrap();
        assert_eq!(restored.created_at(), frame.created_at());
        assert_eq!(restored.created_at().to_rfc3339(), "2023-05-06T07:08:09+00:00");
        assert_eq!(restored.tags().len(), 1);
    }
}

#[test]
fn test_unreadable_records_are_reported_as_failures() {
    let temp_dir = TempDir::new().unwrap();
    let source = write_image(temp_dir.path(), "a.png", 64, 64);
    let tags_dir = temp_dir.path().join("tags");

    let mut detect = Pipeline::new();
    detect
        .add_linear_pipeline(vec![
            Box::new(DetectFaces::new(detector)),
            Box::new(WriteTagsToDirectory::of_kind(tags_dir.as_path(), FACE)),
        ])
        .unwrap();
    detect.run(|p| p.process(Frame::at(source.as_path()))).unwrap();
    let broken = tags_dir.join("0-broken.tag.json");
    std::fs::write(&broken, b"{\"version\": 1").unwrap();

    let (recorder, seen) = Recorder::new("Recorder");
    let mut replay = Pipeline::new();
    replay.add_linear_pipeline(vec![Box::new(recorder)]).unwrap();
    let submitted = replay
        .run(|p| p.process_stream(frames_from_tag_directory(&tags_dir).unwrap()))
        .unwrap();

    assert_eq!(submitted, 2);
    assert_eq!(seen.borrow().len(), 2);
    let failures = replay.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].location, Some(Location::from_path(&broken)));
    assert_eq!(failures[0].stage, None);
}
