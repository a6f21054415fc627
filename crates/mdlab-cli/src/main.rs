//! mdlab CLI - run code blocks in markdown notes.

mod colors;
mod fmt;
mod init;
mod list;
mod run;
mod search;
mod tag;
mod temp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mdlab_core::Config;

#[derive(Parser)]
#[command(name = "mdlab")]
#[command(about = "Run markdown code blocks as notebook cells")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run code cells and write their output back into the document
    Run {
        /// Path to the markdown document
        document: PathBuf,

        /// Run only the cell at this position (see `mdlab list`)
        #[arg(long)]
        cell: Option<usize>,

        /// Print outputs without modifying the document
        #[arg(long)]
        dry_run: bool,
    },

    /// List the cells of a document
    List {
        /// Path to the markdown document
        document: PathBuf,
    },

    /// Rewrite a document in canonical form
    Fmt {
        /// Path to the markdown document
        document: PathBuf,

        /// Fail instead of rewriting when the document is not canonical
        #[arg(long)]
        check: bool,
    },

    /// Set or remove the directive of a code cell
    #[command(after_help = tag::help())]
    Tag {
        /// Path to the markdown document
        document: PathBuf,

        /// Position of the code cell (see `mdlab list`)
        cell: usize,

        /// Directive to set; omit or pass `none` to remove it
        directive: Option<String>,
    },

    /// Print the path of the synthesized program for a language
    Main {
        /// Language id or fence tag (python, rust, js, ...)
        language: String,
    },

    /// Delete the temp workspace
    Clean,

    /// Search markdown notes under the configured base path
    Search {
        /// Text to look for (case-insensitive)
        pattern: String,
    },

    /// Create the notes directory and its entry document
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format mdlab-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<mdlab_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let config = Config::load(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .map_err(format_error)?;

    match cli.command {
        Commands::Run {
            document,
            cell,
            dry_run,
        } => run::execute(config, &document, cell, dry_run)
            .await
            .map_err(format_error)?,

        Commands::List { document } => list::execute(&document).map_err(format_error)?,

        Commands::Fmt { document, check } => fmt::execute(&document, check).map_err(format_error)?,

        Commands::Tag {
            document,
            cell,
            directive,
        } => tag::execute(&document, cell, directive.as_deref()).map_err(format_error)?,

        Commands::Main { language } => temp::main_file(&config, &language).map_err(format_error)?,

        Commands::Clean => temp::clean(&config).map_err(format_error)?,

        Commands::Search { pattern } => search::execute(&config, &pattern).map_err(format_error)?,

        Commands::Init => init::execute(&config).map_err(format_error)?,
    }

    Ok(())
}
