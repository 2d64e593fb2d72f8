//! Ingest Control Surface (C7) HTTP transport, plus the supplemented
//! admin API. `spec.md` §1 excludes "HTTP transport, request parsing,
//! templating for the operator UI" only for the *operator UI*; the
//! ingest RPC's own transport is squarely in scope (§6).

pub mod admin;
pub mod ingest;
pub mod server;
pub mod types;

pub use ingest::{Decision, IngestControl};
pub use server::{run, AppState};
