//! Single-output live-stream rotation orchestrator.
//!
//! See `SPEC_FULL.md` for the full component breakdown (C1–C7). This
//! crate is organized the way `wkmp-ap` organizes its own modules: one
//! file/directory per component, a shared `error` module, and a thin
//! `main.rs` that wires everything together via [`orchestrator::Orchestrator`].

pub mod api;
pub mod compositor;
pub mod config;
pub mod core_state;
pub mod error;
pub mod external;
pub mod health;
pub mod orchestrator;
pub mod persistence;
pub mod queue;
pub mod stream_manager;
pub mod time_manager;
pub mod worker;

pub use error::{OrchestratorError, Result};
pub use orchestrator::Orchestrator;
