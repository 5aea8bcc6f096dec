//! Graph walker.
//!
//! Starting from the selected trigger, the walker repeatedly picks one
//! outgoing edge and advances, executing action and agent nodes as they are
//! reached. A condition picks the edge whose handle matches its outcome;
//! every other node follows its first outgoing edge. The walk ends when
//! there is nowhere to go or the step limit is hit.

use crate::action::ActionExecutor;
use crate::error::ActionError;
use crate::execution::Trace;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeKind};
use tracing::{debug, warn};

/// Maximum number of steps per run.
pub const MAX_STEPS: usize = 50;

/// Why a walk ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// The current node has no outgoing edges.
    NoOutgoingEdge,
    /// A condition had no edge for its outcome.
    NoMatchingBranch,
    /// The chosen edge targets a node that does not exist.
    UnresolvedTarget,
    /// The step limit was reached.
    StepLimit,
}

/// Walks a workflow graph from a trigger.
pub struct GraphWalker<'a> {
    graph: &'a WorkflowGraph,
    actions: &'a ActionExecutor<'a>,
    text: &'a str,
    max_steps: usize,
}

impl<'a> GraphWalker<'a> {
    #[must_use]
    pub fn new(graph: &'a WorkflowGraph, actions: &'a ActionExecutor<'a>, text: &'a str) -> Self {
        Self {
            graph,
            actions,
            text,
            max_steps: MAX_STEPS,
        }
    }

    /// Walks from `start`, appending to `trace`.
    ///
    /// # Errors
    ///
    /// Returns the first action error; the walk stops there.
    pub async fn walk(&self, start: &'a Node, trace: &mut Trace) -> Result<WalkEnd, ActionError> {
        let mut current = start;
        let mut step = 0;

        while step < self.max_steps {
            step += 1;
            trace.push(format!(
                "Step {step}: {} ({})",
                current.label,
                current.node_type()
            ));

            let outgoing = self.graph.outgoing(&current.id);
            if outgoing.is_empty() {
                return Ok(WalkEnd::NoOutgoingEdge);
            }

            let edge = match &current.kind {
                NodeKind::Condition(condition) => {
                    let outcome = condition.evaluate(self.text);
                    trace.push(outcome.trace_entry());
                    let branch = outcome.branch();
                    match outgoing.into_iter().find(|edge| edge.is_branch(branch)) {
                        Some(edge) => edge,
                        None => {
                            debug!(node_id = %current.id, branch, "no edge for condition outcome");
                            return Ok(WalkEnd::NoMatchingBranch);
                        }
                    }
                }
                _ => outgoing[0],
            };

            let Some(next) = self.graph.node(&edge.target) else {
                debug!(source = %edge.source, target = %edge.target, "edge targets unknown node");
                return Ok(WalkEnd::UnresolvedTarget);
            };

            if next.is_executable() {
                self.actions.execute(next, trace).await?;
            }
            current = next;
        }

        warn!(max_steps = self.max_steps, "workflow walk hit the step limit");
        Ok(WalkEnd::StepLimit)
    }
}
