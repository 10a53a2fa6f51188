//! sqldeploy - apply ordered SQL scripts to a managed database over HTTP.
//!
//! This library exposes the core modules for use in integration tests.

pub mod config;
pub mod error;
pub mod executor;
pub mod script;
pub mod validator;
