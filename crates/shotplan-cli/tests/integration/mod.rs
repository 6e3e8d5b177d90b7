//! End-to-end tests for the shotplan pipeline.

pub mod config_tests;
pub mod pipeline_tests;
