//! Queue draining, fan-out, filters and statistics across a stage graph

use super::test_utils::{Recorder, Repeat};
use bamboo::frame::{Frame, Tag};
use bamboo::pipeline::Pipeline;
use bamboo::stage::{FilterFrames, Multiplex};

#[test]
fn test_fan_out_drains_completely() {
    let mut pipeline = Pipeline::new();
    let a = pipeline.add_stage(Repeat { copies: 2 });
    let (b_stage, _b_seen) = Recorder::new("B");
    let (c_stage, c_seen) = Recorder::new("C");
    let b = pipeline.add_stage(b_stage);
    let c = pipeline.add_stage(c_stage);
    pipeline.connect(a, b).unwrap();
    pipeline.connect(b, c).unwrap();
    pipeline.add_entry(a).unwrap();

    pipeline
        .run(|p| p.process(Frame::placeholder(4, 4, 3)))
        .unwrap();

    // everything derived from the call is drained before it returns
    assert_eq!(c_seen.borrow().len(), 2);
    let counts: Vec<u64> = pipeline.stats().iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![1, 2, 2]);
}

#[test]
fn test_rejecting_output_filter_stops_forwarding() {
    let mut pipeline = Pipeline::new();
    let (first_stage, first_seen) = Recorder::new("first");
    let (second_stage, second_seen) = Recorder::new("second");
    let (first, second) = pipeline
        .add_linear_pipeline(vec![Box::new(first_stage), Box::new(second_stage)])
        .unwrap();
    pipeline.set_output_filter(first, |_| false).unwrap();

    pipeline
        .run(|p| p.process_list(vec![Frame::placeholder(1, 1, 1); 3]))
        .unwrap();

    assert_eq!(first_seen.borrow().len(), 3);
    assert!(second_seen.borrow().is_empty());
    assert_eq!(pipeline.stage_stats(first).unwrap().count, 3);
    assert_eq!(pipeline.stage_stats(second).unwrap().count, 0);
    assert!(pipeline.stage_stats(second).unwrap().mean().is_nan());
}

#[test]
fn test_multiple_entries_each_receive_the_frame() {
    let mut pipeline = Pipeline::new();
    let (left_stage, left_seen) = Recorder::new("left");
    let (right_stage, right_seen) = Recorder::new("right");
    let left = pipeline.add_stage(left_stage);
    let right = pipeline.add_stage(right_stage);
    pipeline.add_entry(left).unwrap();
    pipeline.add_entry(right).unwrap();

    pipeline.run(|p| p.process(Frame::placeholder(1, 1, 1))).unwrap();
    assert_eq!(left_seen.borrow().len(), 1);
    assert_eq!(right_seen.borrow().len(), 1);
}

#[test]
fn test_filter_stage_on_tags() {
    let mut pipeline = Pipeline::new();
    let (sink, seen) = Recorder::new("sink");
    pipeline
        .add_linear_pipeline(vec![
            Box::new(Multiplex),
            Box::new(FilterFrames::with_tag("face")),
            Box::new(sink),
        ])
        .unwrap();

    let tagged = Frame::placeholder(2, 2, 1).with_tag(Tag::new("face"));
    let plain = Frame::placeholder(2, 2, 1);
    pipeline
        .run(|p| p.process_list(vec![plain, tagged.clone()]))
        .unwrap();

    assert_eq!(*seen.borrow(), vec![tagged]);
}

#[test]
fn test_stats_table_after_run() {
    let mut pipeline = Pipeline::new().with_stats_on_stop(false);
    pipeline
        .add_linear_pipeline(vec![Box::new(Repeat { copies: 3 }), Box::new(Multiplex)])
        .unwrap();
    pipeline.run(|p| p.process(Frame::placeholder(1, 1, 1))).unwrap();

    let mut out = Vec::new();
    pipeline.print_stats(&mut out).unwrap();
    let table = String::from_utf8(out).unwrap();
    assert!(table.contains("Stage"));
    assert!(table.contains("Repeat"));

    let reports = pipeline.stats();
    assert_eq!(reports[1].count, 3);
    assert!(reports[1].mean >= 0.0);
    assert!(reports[1].summary_line().starts_with("Multiplex: calls: 3"));
}
