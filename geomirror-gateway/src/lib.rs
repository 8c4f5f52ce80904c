//! HTTP gateway for geomirror.
//!
//! Fronts the upstream feature API, mirrors what passes through into the
//! local store, guards mutating routes with a shared API key and records
//! every call in the audit tables.

pub mod api;
pub mod app;
pub mod audit;
pub mod auth;
pub mod config;
pub mod observability;
