//! Upstream feature API client for geomirror.
//!
//! Provides:
//! - Authenticated calls against the remote feature service
//! - A small failure taxonomy (transport vs. upstream status)
//! - Structured wire types for features and their attachments

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{Payload, UpstreamClient};
pub use config::UpstreamConfig;
pub use error::{UpstreamError, UpstreamResult};
pub use types::*;
