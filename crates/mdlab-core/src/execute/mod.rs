//! Execution of synthesized programs.
//!
//! - `context` - Cancellation token, observer callbacks and the completion latch
//! - `orchestrator` - Spawns the toolchain and demultiplexes its output

mod context;
mod orchestrator;

pub use context::{CancelToken, Completion, ExecutionObserver, NoopObserver};
pub use orchestrator::{ExitKind, ProcessOrchestrator, RunOutcome, RunRequest, RunState};
