//! Run command implementation for mdlab CLI.
//!
//! Runs one cell or every code cell of a document and writes the captured
//! outputs back into it.

use std::path::Path;
use std::time::Instant;

use mdlab_core::{CancelToken, Config, ExecutionObserver, RunOutcome, Session};
use mdlab_doc::Cell;

use crate::colors;

/// Prints a line when a cell starts.
struct ProgressObserver;

impl ExecutionObserver for ProgressObserver {
    fn on_started(&self, position: usize) {
        println!("{}Running cell {}...{}", colors::DIM, position, colors::RESET);
    }
}

/// Execute the run command.
pub async fn execute(
    config: Config,
    document: &Path,
    cell: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let path = document.canonicalize()?;
    let mut cells = mdlab_doc::read_document(&path)?;
    let document_dir = path.parent().map(Path::to_path_buf);

    println!(
        "\n{}mdlab{} - Running {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        document.display(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let mut session = Session::new(config);
    let results = match cell {
        Some(position) => {
            let outcome = session
                .run_cell(
                    &mut cells,
                    position,
                    document_dir.as_deref(),
                    &cancel,
                    &ProgressObserver,
                )
                .await;
            ctrl_c.abort();
            vec![(position, Ok(outcome?))]
        }
        None => {
            let results = session
                .run_all(&mut cells, document_dir.as_deref(), &cancel, &ProgressObserver)
                .await;
            ctrl_c.abort();
            results
        }
    };

    if results.is_empty() {
        println!(
            "\n{}No runnable code cells found.{}",
            colors::YELLOW,
            colors::RESET
        );
        return Ok(());
    }

    let mut failed = 0;
    for (position, result) in &results {
        match result {
            Ok(outcome) => {
                if !outcome.success {
                    failed += 1;
                }
                print_outcome(&cells[*position], *position, outcome);
            }
            Err(e) => {
                failed += 1;
                println!(
                    "\n{}✗ cell {}{} {}",
                    colors::RED,
                    position,
                    colors::RESET,
                    e.with_hint()
                );
            }
        }
    }

    if failed > 0
        && let Some(main) = session.main_file()
    {
        println!(
            "\n{}Last synthesized program: {}{}",
            colors::DIM,
            main.display(),
            colors::RESET
        );
    }

    if dry_run {
        println!("\n{}Dry run, document not modified{}", colors::DIM, colors::RESET);
    } else {
        mdlab_doc::write_document(&path, &cells)?;
    }

    println!("\n{}", "─".repeat(50));
    println!(
        "{}Completed{} {} cells in {:.2}s",
        colors::GREEN,
        colors::RESET,
        results.len(),
        start.elapsed().as_secs_f64()
    );

    if failed > 0 {
        anyhow::bail!("{} of {} cells failed", failed, results.len());
    }
    Ok(())
}

fn print_outcome(cell: &Cell, position: usize, outcome: &RunOutcome) {
    let (color, mark) = if outcome.success {
        (colors::GREEN, "✓")
    } else {
        (colors::RED, "✗")
    };
    let exit = outcome
        .exit
        .map(|exit| format!(", {}", exit))
        .unwrap_or_default();

    println!(
        "\n{}{} cell {}{} {} ({}{}, {:.2}s)",
        color,
        mark,
        position,
        colors::RESET,
        cell.language().unwrap_or_default(),
        outcome.state,
        exit,
        outcome.duration.as_secs_f64()
    );
    if let Some(output) = &outcome.output {
        println!("{}", output);
    }
}
