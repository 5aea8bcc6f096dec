//! Core identifiers and error handling shared by the flowbot crates.
//!
//! Bots, workflows and execution logs are persisted by an external store;
//! this crate only fixes how they are named and how errors propagate.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{BotId, ExecutionLogId, ParseIdError, WorkflowId};
