//! Text generation for flowbot agent nodes.
//!
//! Agent nodes hand a rendered system/user prompt pair to a
//! [`TextGenerator`] and send whatever comes back to the chat. Provider
//! clients live outside this workspace; this crate fixes the request shape
//! and the prompt templating.

pub mod backend;
pub mod error;
pub mod prompt;

pub use backend::{AiProvider, GenerateRequest, TextGenerator};
pub use error::GenerateError;
pub use prompt::{PromptTemplate, PromptVariables};
