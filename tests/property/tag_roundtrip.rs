//! Property-based tests for the structured tag and frame forms

use bamboo::frame::{Frame, Tag, TagValue};
use bamboo::types::Region;
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = TagValue> {
    prop_oneof![
        any::<i64>().prop_map(TagValue::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(TagValue::Float),
        ".{0,16}".prop_map(TagValue::Str),
        any::<bool>().prop_map(TagValue::Bool),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(TagValue::Bytes),
    ]
}

fn value() -> impl Strategy<Value = TagValue> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(TagValue::List),
            proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(TagValue::Map),
        ]
    })
}

fn tag() -> impl Strategy<Value = Tag> {
    (
        "[a-z]{1,8}",
        ".{0,12}",
        proptest::option::of((0u32..1000, 0u32..1000, 0u32..500, 0u32..500)),
        proptest::collection::btree_map("[a-z_]{1,10}", value(), 0..5),
    )
        .prop_map(|(kind, label, region, attributes)| {
            let mut tag = Tag::new(kind).with_label(label);
            if let Some((x, y, w, h)) = region {
                tag = tag.with_region(Region::new((x, y), w, h));
            }
            for (key, value) in attributes {
                tag.set(key, value);
            }
            tag
        })
}

proptest! {
    #[test]
    fn test_tag_structured_round_trip(tag in tag()) {
        let restored = Tag::from_structured(tag.to_structured().unwrap()).unwrap();
        prop_assert_eq!(restored, tag);
    }

    #[test]
    fn test_tag_survives_json_text(tag in tag()) {
        let text = serde_json::to_string(&tag.to_structured().unwrap()).unwrap();
        let restored = Tag::from_structured(serde_json::from_str(&text).unwrap()).unwrap();
        prop_assert_eq!(restored, tag);
    }

    #[test]
    fn test_non_finite_numbers_never_serialize(
        tag in tag(),
        bad in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
    ) {
        let tag = tag.with_attribute("zz_score", vec![TagValue::Float(bad)]);
        prop_assert!(tag.to_structured().is_err());
    }

    #[test]
    fn test_frame_round_trip_keeps_tags_in_order(tags in proptest::collection::vec(tag(), 0..5)) {
        let mut frame = Frame::at("/photos/2021-06-01T12:00:00.png");
        for tag in &tags {
            frame.add_tag(tag.clone());
        }
        let restored = Frame::from_structured(frame.to_structured().unwrap()).unwrap();
        prop_assert_eq!(restored.tags(), tags.as_slice());
        prop_assert_eq!(restored, frame);
    }
}
