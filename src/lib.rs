//! Library entrypoint for release-on-tag.
//!
//! The primary interface is the `release-on-tag` binary. This lib target
//! exposes the pipeline pieces to integration tests.

pub mod artifact;
pub mod config;
pub mod git;
pub mod github;
pub mod output;
pub mod package;
pub mod platform;
pub mod release;
pub mod upload;
