//! Gateway HTTP API module.
//!
//! `features` and `attachments` front the upstream and mirror what passes
//! through; `local` serves the mirror only; `municipalities` is local
//! reference data.
pub mod attachments;
pub mod error;
pub mod features;
pub mod local;
pub mod municipalities;
pub mod system;
pub mod types;
