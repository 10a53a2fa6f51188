//! Integration tests for sqldeploy.

pub mod common;
pub mod deploy_test;
pub mod validate_test;
