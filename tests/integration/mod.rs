//! Integration tests for db-sage.

pub mod engine_test;
pub mod preview_test;
pub mod source_test;
