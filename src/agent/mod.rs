//! Agent subsystem.
//!
//! - **Config**: the agent configuration store (`.claude/agents/*.md`)
//! - **Routing**: the label table and agent type enumeration
//! - **Router**: task-to-agent resolution with fallbacks
//! - **Prompt**: task prompt templates
//! - **Runner**: launching the agent process
//!
//! Agents are external processes. They close or block their own tasks
//! through the tracker; ralph only observes the result.

pub mod config;
pub mod prompt;
pub mod router;
pub mod routing;
pub mod runner;

pub use config::{AgentConfig, AgentSource, AgentStore};
pub use router::{RouteDecision, Router};
pub use routing::{AgentType, RoutingTable};
pub use runner::{AgentInvocation, AgentRunner, CommandRunner, RunnerExit};
