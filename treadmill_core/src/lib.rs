#![forbid(unsafe_code)]

//! Core domain model and session engine for the Stride treadmill system.
//!
//! This crate provides:
//! - Domain types (pace types, segments, workouts, session logs)
//! - Workout catalog
//! - The live workout session engine and its event-loop runner
//! - Session history (JSONL, CSV rollup)
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod clock;
pub mod heartbeat;
pub mod session;
pub mod engine;
pub mod runner;
pub mod history;
pub mod rollup;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, InMemoryCatalog, WorkoutCatalog};
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock};
pub use heartbeat::{Heartbeat, ManualHeartbeat, ThreadHeartbeat};
pub use session::SessionState;
pub use engine::{EndOutcome, EngineSettings, WorkoutSessionEngine};
pub use runner::{Command, DriverEvent, SessionRunner};
pub use history::{load_recent_summaries, JsonlHistory, MemoryHistory, SessionHistory};
