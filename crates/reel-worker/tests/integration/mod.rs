//! Integration tests for the render worker.

pub mod executor_tests;
pub mod pipeline_tests;
pub mod support;
