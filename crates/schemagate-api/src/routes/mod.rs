//! # API Route Modules
//!
//! - `validate`: validation against stored and inline schemas.
//! - `schemas`: schema retrieval, upload and listing.
//! - `stats`: per-path validation counters.

pub mod schemas;
pub mod stats;
pub mod validate;
