//! Property-based tests

mod region;
mod stats;
mod tag_roundtrip;
