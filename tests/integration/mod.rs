//! Integration tests for the bamboo frame pipeline

mod config_integration;
mod end_to_end;
mod error_recovery;
mod frame_model;
mod pipeline_drain;
mod tag_exchange;
mod test_utils;
