//! Per-document session.
//!
//! A [`Session`] owns everything a cell run needs besides the cells: the
//! configuration, the temp workspace and the family that ran last.

use std::path::{Path, PathBuf};

use mdlab_doc::{Cell, CellKind, Directive, bump_image_versions};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::execute::{
    CancelToken, Completion, ExecutionObserver, ProcessOrchestrator, RunOutcome, RunRequest,
};
use crate::family::LanguageFamily;
use crate::history::History;
use crate::synth::{SynthesisContext, synthesizer_for};
use crate::workspace::TempWorkspace;

/// Runs the cells of one document against a shared temp workspace.
pub struct Session {
    config: Config,
    workspace: TempWorkspace,
    last_language: Option<LanguageFamily>,
    orchestrator: ProcessOrchestrator,
}

impl Session {
    /// Create a session with its temp workspace under `config.temp_path`.
    pub fn new(config: Config) -> Self {
        let workspace = TempWorkspace::new(config.temp_path.clone());
        Self {
            config,
            workspace,
            last_language: None,
            orchestrator: ProcessOrchestrator::new(),
        }
    }

    /// Replace the orchestrator (builder style).
    pub fn with_orchestrator(mut self, orchestrator: ProcessOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Temp workspace programs are written to.
    pub fn workspace(&self) -> &TempWorkspace {
        &self.workspace
    }

    /// Family of the most recent run.
    pub fn last_language(&self) -> Option<LanguageFamily> {
        self.last_language
    }

    /// Synthesized entry file of the most recently run family.
    pub fn main_file(&self) -> Option<PathBuf> {
        self.last_language
            .map(|family| self.workspace.entry_path(family))
    }

    /// Run the code cell at `position`.
    ///
    /// On success the cell's output is replaced and image references in the
    /// following prose cell are cache-busted. `observer` sees exactly one
    /// `on_finished` per call, including for errors.
    pub async fn run_cell(
        &mut self,
        cells: &mut [Cell],
        position: usize,
        document_dir: Option<&Path>,
        cancel: &CancelToken,
        observer: &dyn ExecutionObserver,
    ) -> Result<RunOutcome> {
        let completion = Completion::new();
        let result = self
            .run_cell_inner(cells, position, document_dir, cancel, observer, &completion)
            .await;

        match &result {
            Ok(outcome) => {
                completion.finish(observer, position, outcome.success);
            }
            Err(e) => {
                tracing::warn!("Cell {} failed: {}", position, e);
                completion.finish(observer, position, false);
            }
        }
        result
    }

    async fn run_cell_inner(
        &mut self,
        cells: &mut [Cell],
        position: usize,
        document_dir: Option<&Path>,
        cancel: &CancelToken,
        observer: &dyn ExecutionObserver,
        completion: &Completion,
    ) -> Result<RunOutcome> {
        let cell = cells.get(position).ok_or(Error::CellNotFound(position))?;
        if !cell.is_code() {
            return Err(Error::NotACodeCell(position));
        }
        observer.on_started(position);

        match &cell.directive {
            Some(Directive::Skip) => {
                tracing::info!("Skipping cell {}", position);
                return Ok(RunOutcome::immediate());
            }
            Some(Directive::Create(file)) => {
                let path = self.workspace.write_file(file, &cell.content, true)?;
                tracing::info!("Wrote cell {} to {}", position, path.display());
                return Ok(RunOutcome::immediate());
            }
            _ => {}
        }

        let language = cell.language().unwrap_or_default().to_string();

        let family = LanguageFamily::from_language(&language)
            .ok_or_else(|| Error::UnsupportedLanguage(language.clone()))?;
        let synthesizer = synthesizer_for(family, &self.config);

        let history = History::collect(cells, position)?;
        tracing::debug!(
            "Found {} {} cells up to position {}",
            history.len(),
            language,
            position
        );

        let ctx = SynthesisContext::new(
            self.workspace.root(),
            document_dir.map(Path::to_path_buf),
        );
        let program = synthesizer.synthesize(&history, &ctx);

        self.workspace
            .write_file(synthesizer.entry_file(), &program.source, true)?;
        for file in &program.files {
            self.workspace
                .write_file(&file.path, &file.contents, file.overwrite)?;
        }
        self.last_language = Some(family);

        let toolchain = synthesizer.toolchain()?;
        let launch = synthesizer.launch(&program, &toolchain, &ctx);
        let request = RunRequest::new(position, launch, &program);

        // Only a run that actually starts replaces the saved output.
        cells[position].set_output(None);

        let outcome = self
            .orchestrator
            .run(request, cancel, observer, completion)
            .await?;

        if outcome.success {
            if let Some(output) = &outcome.output {
                cells[position].set_output(Some(output.clone()));
            }
            bump_following_images(cells, position);
        }

        Ok(outcome)
    }

    /// Run every code cell of a supported language, in document order.
    ///
    /// Stops early once `cancel` fires. Errors of one cell do not stop the
    /// others.
    pub async fn run_all(
        &mut self,
        cells: &mut [Cell],
        document_dir: Option<&Path>,
        cancel: &CancelToken,
        observer: &dyn ExecutionObserver,
    ) -> Vec<(usize, Result<RunOutcome>)> {
        let positions: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| {
                cell.kind == CellKind::Code
                    && cell
                        .language()
                        .is_some_and(|lang| LanguageFamily::from_language(lang).is_some())
            })
            .map(|(position, _)| position)
            .collect();

        let mut results = Vec::with_capacity(positions.len());
        for position in positions {
            if cancel.is_cancelled() {
                tracing::info!("Run cancelled before cell {}", position);
                break;
            }
            let result = self
                .run_cell(cells, position, document_dir, cancel, observer)
                .await;
            results.push((position, result));
        }
        results
    }
}

/// Bump image versions in the prose cell right after `position`.
fn bump_following_images(cells: &mut [Cell], position: usize) {
    let Some(next) = cells.get_mut(position + 1) else {
        return;
    };
    if next.kind != CellKind::Prose {
        return;
    }
    if let Some(bumped) = bump_image_versions(&next.content) {
        tracing::debug!("Bumped image versions in cell {}", position + 1);
        next.content = bumped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::NoopObserver;
    use crate::family::Shell;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_started(&self, position: usize) {
            self.events.lock().unwrap().push(format!("started {position}"));
        }

        fn on_finished(&self, position: usize, success: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finished {position} {success}"));
        }
    }

    fn session(temp: &TempDir) -> Session {
        Session::new(Config {
            temp_path: temp.path().join("mdl"),
            ..Config::default()
        })
    }

    fn has_bash() -> bool {
        which::which("bash").is_ok()
    }

    #[tokio::test]
    async fn test_skip_succeeds_without_running() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![Cell::code("bash", "exit 1").with_directive(Directive::Skip)];
        cells[0].set_output(Some("old".to_string()));

        let outcome = session
            .run_cell(&mut cells, 0, None, &CancelToken::new(), &NoopObserver)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit, None);
        assert_eq!(cells[0].captured_output.as_deref(), Some("old"));
        assert_eq!(session.last_language(), None);
    }

    #[tokio::test]
    async fn test_create_writes_into_workspace() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![
            Cell::code("python", "def helper():\n    return 1")
                .with_directive(Directive::Create("pkg/helper.py".to_string())),
        ];

        let outcome = session
            .run_cell(&mut cells, 0, None, &CancelToken::new(), &NoopObserver)
            .await
            .unwrap();

        assert!(outcome.success);
        let written = std::fs::read_to_string(temp.path().join("mdl/pkg/helper.py")).unwrap();
        assert_eq!(written, "def helper():\n    return 1");
    }

    #[tokio::test]
    async fn test_invalid_positions() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![Cell::prose("# Title")];
        let recorder = Recorder::default();

        let err = session
            .run_cell(&mut cells, 0, None, &CancelToken::new(), &recorder)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotACodeCell(0)));

        let err = session
            .run_cell(&mut cells, 5, None, &CancelToken::new(), &recorder)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CellNotFound(5)));

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["finished 0 false", "finished 5 false"]
        );
    }

    #[tokio::test]
    async fn test_unsupported_language_finishes_once() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![Cell::code("openai", "write a haiku")];
        cells[0].set_output(Some("an old silent pond".to_string()));
        let recorder = Recorder::default();

        let err = session
            .run_cell(&mut cells, 0, None, &CancelToken::new(), &recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedLanguage(ref lang) if lang == "openai"));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["started 0", "finished 0 false"]
        );
        assert_eq!(cells[0].captured_output.as_deref(), Some("an old silent pond"));
    }

    #[tokio::test]
    async fn test_bash_cell_end_to_end() {
        if !has_bash() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![
            Cell::code("bash", "echo first"),
            Cell::code("bash", "echo second"),
            Cell::prose("<img src=\"plot.png\">"),
        ];
        let recorder = Recorder::default();

        let outcome = session
            .run_cell(&mut cells, 1, Some(temp.path()), &CancelToken::new(), &recorder)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(cells[1].captured_output.as_deref(), Some("second"));
        assert_eq!(cells[2].content, "<img src=\"plot.png?version=1\">");
        assert_eq!(session.last_language(), Some(LanguageFamily::Shell(Shell::Bash)));
        assert_eq!(
            session.main_file(),
            Some(temp.path().join("mdl").join("shell").join("main.sh"))
        );
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["started 1", "finished 1 true"]
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_output_empty() {
        if !has_bash() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![Cell::code("bash", "echo noisy").with_directive(Directive::Clear)];
        cells[0].set_output(Some("stale".to_string()));

        let outcome = session
            .run_cell(&mut cells, 0, None, &CancelToken::new(), &NoopObserver)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(cells[0].captured_output, None);
    }

    #[tokio::test]
    async fn test_run_all_skips_unsupported_languages() {
        if !has_bash() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![
            Cell::prose("intro"),
            Cell::code("bash", "echo a"),
            Cell::code("text", "not a program"),
            Cell::code("bash", "echo b"),
        ];

        let results = session
            .run_all(&mut cells, None, &CancelToken::new(), &NoopObserver)
            .await;

        let positions: Vec<usize> = results.iter().map(|(position, _)| *position).collect();
        assert_eq!(positions, vec![1, 3]);
        assert_eq!(cells[1].captured_output.as_deref(), Some("a"));
        assert_eq!(cells[3].captured_output.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_run_all_stops_when_cancelled() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        let mut cells = vec![Cell::code("bash", "echo a")];
        let cancel = CancelToken::new();
        cancel.cancel();

        let results = session.run_all(&mut cells, None, &cancel, &NoopObserver).await;
        assert!(results.is_empty());
    }
}
