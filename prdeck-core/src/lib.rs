//! Domain model and GitHub access for prdeck.
//!
//! The TUI crate depends only on the types, status rules and port traits defined here. The
//! [`github`] module provides the production implementation of those ports on top of the `gh` CLI.

pub mod error;
pub mod github;
pub mod group;
pub mod logs;
pub mod ports;
pub mod status;
pub mod types;

pub use error::GithubError;
