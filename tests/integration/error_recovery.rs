//! Skip-and-continue: bad frames are recorded, the run goes on

use super::test_utils::{write_image, Decode, Recorder};
use bamboo::error::{FrameError, PipelineError};
use bamboo::frame::Frame;
use bamboo::pipeline::Pipeline;
use bamboo::source::{frames_from_locations, FrameStream};
use bamboo::storage::Location;
use tempfile::TempDir;

fn decoding_pipeline() -> (Pipeline, std::rc::Rc<std::cell::RefCell<Vec<Frame>>>) {
    let mut pipeline = Pipeline::new();
    let (sink, seen) = Recorder::new("sink");
    pipeline
        .add_linear_pipeline(vec![Box::new(Decode), Box::new(sink)])
        .unwrap();
    (pipeline, seen)
}

#[test]
fn test_zero_byte_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    write_image(temp_dir.path(), "a.png", 16, 16);
    std::fs::write(temp_dir.path().join("b.png"), b"").unwrap();
    write_image(temp_dir.path(), "c.png", 16, 16);

    let (mut pipeline, seen) = decoding_pipeline();
    let submitted = pipeline
        .run(|p| p.process_stream(FrameStream::new(temp_dir.path())))
        .unwrap();

    assert_eq!(submitted, 3);
    let names: Vec<String> = seen
        .borrow()
        .iter()
        .map(|f| f.location().and_then(Location::file_name).unwrap_or("").to_string())
        .collect();
    assert_eq!(names, vec!["a.png", "c.png"]);

    let failures = pipeline.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].location,
        Some(Location::from_path(temp_dir.path().join("b.png")))
    );
    assert_eq!(failures[0].stage.as_deref(), Some("Decode"));
    assert!(failures[0].message.starts_with("Not an image"));
}

#[test]
fn test_corrupt_and_missing_files_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let good = write_image(temp_dir.path(), "good.jpg", 16, 16);
    let corrupt = temp_dir.path().join("corrupt.jpg");
    std::fs::write(&corrupt, b"definitely not a jpeg").unwrap();
    let missing = temp_dir.path().join("missing.jpg");

    let (mut pipeline, seen) = decoding_pipeline();
    let locations = [good.as_path(), corrupt.as_path(), missing.as_path()];
    pipeline
        .run(|p| p.process_stream(frames_from_locations(locations)))
        .unwrap();

    assert_eq!(seen.borrow().len(), 1);
    let messages: Vec<&str> = pipeline.failures().iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Not an image"));
    assert!(messages[1].starts_with("Image not found"));
}

#[test]
fn test_open_distinguishes_error_kinds() {
    let temp_dir = TempDir::new().unwrap();
    let empty = temp_dir.path().join("empty.png");
    std::fs::write(&empty, b"").unwrap();
    let (pipeline, _) = decoding_pipeline();
    let cache = pipeline.cache();

    assert!(matches!(
        Frame::open(empty.as_path(), cache),
        Err(FrameError::NotAnImage { .. })
    ));
    assert!(matches!(
        Frame::open(temp_dir.path().join("absent.png"), cache),
        Err(FrameError::NotFound { .. })
    ));
}

#[test]
fn test_unsupported_scheme_halts_the_run() {
    let (mut pipeline, seen) = decoding_pipeline();
    let result = pipeline.run(|p| {
        p.process_stream(frames_from_locations(["s3://bucket/a.jpg", "s3://bucket/b.jpg"]))
    });

    assert!(matches!(result, Err(PipelineError::Stage { ref stage, .. }) if stage == "Decode"));
    assert!(seen.borrow().is_empty());
    assert!(!pipeline.is_running());
}
