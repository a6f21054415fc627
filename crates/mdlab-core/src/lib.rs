//! Execution engine for mdlab notebooks.
//!
//! Running a cell never talks to a live interpreter. Instead the engine:
//! - collects every earlier cell of the same language ([`History`])
//! - synthesizes one standalone program from them ([`synth`])
//! - runs it with the language's toolchain ([`execute`])
//! - splits the output on per-cell markers and keeps the run cell's segment
//!   ([`OutputDemultiplexer`])

pub mod config;
pub mod demux;
pub mod error;
pub mod execute;
pub mod family;
pub mod history;
pub mod session;
pub mod synth;
pub mod toolchain;
pub mod workspace;

pub use config::Config;
pub use demux::{OutputDemultiplexer, SENTINEL};
pub use error::{Error, Result};
pub use execute::{
    CancelToken, ExecutionObserver, ExitKind, NoopObserver, ProcessOrchestrator, RunOutcome,
    RunState,
};
pub use family::{LanguageFamily, Shell};
pub use history::{History, HistoryEntry};
pub use session::Session;
pub use synth::{Launch, SynthesisContext, SynthesizedProgram, Synthesizer, synthesizer_for};
pub use toolchain::Toolchain;
pub use workspace::TempWorkspace;
