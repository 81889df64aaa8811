//! `runway-core`: campaign progress and revelation engine.
//!
//! ```text
//! ProgressStore ──load──▶ Session ──fetch──▶ RunwayApi
//!                           │
//!                           ▼
//!                       Dashboard
//!                 ┌─────────┼──────────┐
//!                 ▼         ▼          ▼
//!            progress    reveal      Finale
//!          (percentage) (per stage) (synthesis)
//! ```
//!
//! Everything below [`session`] is synchronous and free of I/O apart from the
//! store; the session owns the network futures.

pub mod api;
pub mod campaign;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod finale;
pub mod io;
pub mod paths;
pub mod progress;
pub mod reveal;
pub mod session;
pub mod store;

pub use error::{Result, RunwayError};
