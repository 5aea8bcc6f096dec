//! Error handling foundation for flowbot.
//!
//! Trait seams in each crate return plain error enums. Orchestration code
//! (the update dispatcher, the runner) wraps them in a rootcause `Report`
//! so callers get the typed context plus the chain that led to it.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
