//! Workflow engine for flowbot.
//!
//! This crate interprets the chat automations built in the visual editor:
//!
//! - **Graph Model**: stored definitions resolved into typed nodes and ordered edges
//! - **Trigger Matcher**: picks the entry point for an inbound event
//! - **Graph Walker**: follows edges, branching on conditions and executing actions
//! - **Engine**: runs one definition and folds every failure into an execution result
//! - **Dispatcher**: routes Bot API updates to a bot's workflows and logs the runs

pub mod action;
pub mod condition;
pub mod definition;
pub mod dispatcher;
pub mod edge;
pub mod engine;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;
pub mod store;
pub mod trigger;
pub mod walker;

pub use action::{ActionExecutor, ActionKind, AgentConfig, ButtonSpec};
pub use condition::{ConditionKind, ConditionOutcome};
pub use definition::{EdgeSpec, NodeData, NodeSpec, WorkflowDefinition};
pub use dispatcher::{DispatchSummary, UpdateDispatcher, WorkflowRun};
pub use edge::{Edge, SourceHandle};
pub use engine::WorkflowEngine;
pub use error::{ActionError, DefinitionError, DispatchError, StoreError};
pub use execution::{BotIdentity, ExecutionContext, ExecutionResult, ExecutionStatus, Trace};
pub use graph::{GraphDiagnostics, WorkflowGraph};
pub use node::{Node, NodeId, NodeKind, NodeType};
pub use store::{BotRecord, ExecutionLog, InMemoryWorkflowStore, StoredWorkflow, WorkflowStore};
pub use trigger::{MessageRule, TriggerKind, TriggerMatcher};
pub use walker::{GraphWalker, MAX_STEPS, WalkEnd};
