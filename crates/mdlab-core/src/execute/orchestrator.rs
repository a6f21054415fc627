//! Process orchestration for one cell run.
//!
//! ```text
//! Idle ──► Started ──► Streaming ──► Closed
//!             │            │
//!             ▼            └───────► Cancelled
//!          Errored
//! ```
//!
//! Preparation steps run first, then the main process is spawned with piped
//! stdout/stderr. Every chunk from either stream goes through the
//! [`OutputDemultiplexer`]. Cancellation sends a termination signal and ends
//! the run unsuccessfully; the process's own exit racing the cancellation is
//! resolved by the [`Completion`] latch.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use crate::demux::OutputDemultiplexer;
use crate::error::{Error, Result};
use crate::synth::{Invocation, Launch, SynthesizedProgram};

use super::context::{CancelToken, Completion, ExecutionObserver};

/// Time a cancelled process gets to exit after the termination signal.
const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8192;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Process spawned.
    Started,
    /// At least one chunk of output received.
    Streaming,
    /// Process exited on its own.
    Closed,
    /// The process could not be spawned.
    Errored,
    /// Cancelled before the process exited.
    Cancelled,
}

impl RunState {
    /// Whether the run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored | Self::Cancelled)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    /// Killed by a signal, no exit code.
    Signaled,
}

impl From<ExitStatus> for ExitKind {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::Exited(code),
            None => Self::Signaled,
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit code {}", code),
            Self::Signaled => f.write_str("terminated by signal"),
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Terminal state: `Closed` or `Cancelled`.
    pub state: RunState,
    pub success: bool,
    /// Output to store on the cell, `None` when there is none or it is suppressed.
    pub output: Option<String>,
    /// `None` when the process was cancelled or never spawned.
    pub exit: Option<ExitKind>,
    pub duration: Duration,
}

impl RunOutcome {
    /// A run that finished without spawning anything.
    pub fn immediate() -> Self {
        Self {
            state: RunState::Closed,
            success: true,
            output: None,
            exit: None,
            duration: Duration::ZERO,
        }
    }
}

/// One run to perform.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Position of the cell in the document.
    pub position: usize,
    pub launch: Launch,
    /// Segment holding the cell's output.
    pub target_segment: usize,
    pub suppress_output: bool,
}

impl RunRequest {
    /// Request a run of `launch`, reading output for the program's target segment.
    pub fn new(position: usize, launch: Launch, program: &SynthesizedProgram) -> Self {
        Self {
            position,
            launch,
            target_segment: program.target_segment,
            suppress_output: program.suppress_output,
        }
    }
}

/// Spawns synthesized programs and routes their output back to the cell.
#[derive(Debug, Clone)]
pub struct ProcessOrchestrator {
    kill_grace: Duration,
}

impl Default for ProcessOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessOrchestrator {
    /// Create an orchestrator with the default kill grace period.
    pub fn new() -> Self {
        Self {
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Set how long a cancelled process may take to exit before it is killed.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Run a launch to completion.
    ///
    /// `completion` reports the end of the run to `observer` exactly once.
    /// Spawn failures are returned as errors after the run is finished
    /// unsuccessfully; a non-zero exit is not an error.
    pub async fn run(
        &self,
        request: RunRequest,
        cancel: &CancelToken,
        observer: &dyn ExecutionObserver,
        completion: &Completion,
    ) -> Result<RunOutcome> {
        let position = request.position;
        let started = Instant::now();
        let mut state = RunState::Idle;

        for step in &request.launch.preparation {
            if !self.prepare(step, cancel).await {
                return Ok(self.cancelled(position, &mut state, started, observer, completion));
            }
        }

        if cancel.is_cancelled() {
            return Ok(self.cancelled(position, &mut state, started, observer, completion));
        }

        let mut child = match spawn(&request.launch.main) {
            Ok(child) => child,
            Err(e) => {
                transition(position, &mut state, RunState::Errored);
                completion.finish(observer, position, false);
                return Err(e);
            }
        };
        transition(position, &mut state, RunState::Started);

        let mut demux = OutputDemultiplexer::new(request.target_segment);
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];
        let mut last_visible: Option<String> = None;

        while stdout.is_some() || stderr.is_some() {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.terminate(&mut child).await;
                    return Ok(self.cancelled(position, &mut state, started, observer, completion));
                }
                read = read_chunk(&mut stdout, &mut out_buf) => match read {
                    Ok(0) | Err(_) => {
                        stdout = None;
                        None
                    }
                    Ok(n) => Some(&out_buf[..n]),
                },
                read = read_chunk(&mut stderr, &mut err_buf) => match read {
                    Ok(0) | Err(_) => {
                        stderr = None;
                        None
                    }
                    Ok(n) => Some(&err_buf[..n]),
                },
            };

            let Some(chunk) = chunk else { continue };
            if state == RunState::Started {
                transition(position, &mut state, RunState::Streaming);
            }

            let visible = demux.push(chunk);
            if !request.suppress_output
                && let Some(text) = visible
                && last_visible.as_ref() != Some(&text)
            {
                observer.on_output(position, &text);
                last_visible = Some(text);
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.terminate(&mut child).await;
                return Ok(self.cancelled(position, &mut state, started, observer, completion));
            }
            status = child.wait() => status?,
        };
        transition(position, &mut state, RunState::Closed);

        let exit = ExitKind::from(status);
        let success = status.success() || demux.has_output();
        let output = if request.suppress_output {
            None
        } else {
            demux.final_output()
        };

        tracing::info!(
            "Cell {} finished ({}, success: {}, {:?})",
            position,
            exit,
            success,
            started.elapsed()
        );
        completion.finish(observer, position, success);

        Ok(RunOutcome {
            state,
            success,
            output,
            exit: Some(exit),
            duration: started.elapsed(),
        })
    }

    /// Run a preparation step to completion.
    ///
    /// Failures are logged and ignored. Returns `false` when cancelled.
    async fn prepare(&self, step: &Invocation, cancel: &CancelToken) -> bool {
        tracing::info!("Preparing: {}", step);

        let mut command = command(step);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        tokio::select! {
            _ = cancel.cancelled() => false,
            output = command.output() => {
                match output {
                    Ok(output) if output.status.success() => {}
                    Ok(output) => tracing::warn!(
                        "{} failed ({}): {}",
                        step,
                        ExitKind::from(output.status),
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                    Err(e) => tracing::warn!("{} could not start: {}", step, e),
                }
                true
            }
        }
    }

    /// Send a termination signal, then kill if the process does not exit in time.
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                // SIGTERM lets the toolchain clean up its own children
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGTERM);
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        if tokio::time::timeout(self.kill_grace, child.wait())
            .await
            .is_err()
        {
            tracing::warn!("Process did not exit after termination signal, killing");
            let _ = child.kill().await;
        }
    }

    fn cancelled(
        &self,
        position: usize,
        state: &mut RunState,
        started: Instant,
        observer: &dyn ExecutionObserver,
        completion: &Completion,
    ) -> RunOutcome {
        transition(position, state, RunState::Cancelled);
        completion.finish(observer, position, false);

        RunOutcome {
            state: *state,
            success: false,
            output: None,
            exit: None,
            duration: started.elapsed(),
        }
    }
}

fn transition(position: usize, state: &mut RunState, next: RunState) {
    tracing::debug!("Cell {}: {} -> {}", position, state, next);
    *state = next;
}

fn command(invocation: &Invocation) -> Command {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    command
}

fn spawn(invocation: &Invocation) -> Result<Child> {
    tracing::info!("Running: {} (in {})", invocation, invocation.cwd.display());

    command(invocation)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Spawn {
            program: invocation.program.display().to_string(),
            message: e.to_string(),
        })
}

/// Read from a stream, or wait forever once it has been closed.
async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}
