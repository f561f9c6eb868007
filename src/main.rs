//! epub-replenish - patch remote article images back into EPUB digests.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use epub_replenish::{
    Error, HttpFetcher, WorkDir, extract_epub, localize_images, pack_epub, register_images,
    scan_remote_images, timestamped_path,
};

const LOG_FILE: &str = "epub-replenish.log";

#[derive(Parser)]
#[command(name = "epub-replenish", version)]
#[command(about = "Repair periodical EPUBs whose article images point at remote URLs", long_about = None)]
#[command(after_help = "EXAMPLES:
    epub-replenish check -l digest.epub      List every remote image reference
    epub-replenish replenish digest.epub     Write a patched, timestamped copy
    epub-replenish replenish -r digest.epub  Patch the file in place")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan for remote image references without modifying anything
    Check {
        /// Print every reference, not just the count
        #[arg(short, long)]
        list: bool,

        /// EPUB files to scan
        #[arg(value_name = "EPUB_FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Download remote images, rewrite the content, and repackage
    Replenish {
        /// Replace the original file instead of writing a timestamped copy
        #[arg(short = 'r', long = "override")]
        overwrite: bool,

        /// EPUB files to repair
        #[arg(value_name = "EPUB_FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "run started");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Error> {
    let files = match &cli.command {
        Command::Check { files, .. } | Command::Replenish { files, .. } => files.clone(),
    };

    let missing: Vec<&PathBuf> = files.iter().filter(|p| !p.is_file()).collect();
    if !missing.is_empty() {
        eprintln!("error: input file(s) missing or not regular files:");
        for path in &missing {
            eprintln!("  {}", path.display());
            error!(file = %path.display(), "input file missing");
        }
        return Ok(ExitCode::FAILURE);
    }

    let mut failed = false;
    for file in &files {
        info!(file = %file.display(), "processing");
        match process_file(file, &cli.command) {
            Ok(()) => {}
            // An unreadable archive skips that file only; everything else
            // aborts the run.
            Err(Error::Zip(e)) => {
                failed = true;
                eprintln!("error: {}: invalid EPUB archive: {e}", file.display());
                error!(file = %file.display(), "invalid archive: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn process_file(epub: &Path, command: &Command) -> Result<(), Error> {
    let workdir = WorkDir::create()?;
    extract_epub(epub, workdir.path())?;

    let refs = scan_remote_images(workdir.path())?;
    println!("{} remote image(s) found in {}.", refs.len(), epub.display());
    info!(file = %epub.display(), count = refs.len(), "scan complete");

    match command {
        Command::Check { list, .. } => {
            for r in &refs {
                info!(file = %r.html_path.display(), url = %r.url, "remote image");
                if *list {
                    println!("[{}] -> [{}]", r.html_path.display(), r.url);
                }
            }
        }
        Command::Replenish { overwrite, .. } => {
            if refs.is_empty() {
                println!("Nothing to replenish.");
                return Ok(());
            }

            let fetcher = HttpFetcher::new();
            let saved = localize_images(&refs, workdir.path(), &fetcher)?;
            register_images(workdir.path(), &saved)?;

            let out = if *overwrite {
                epub.to_path_buf()
            } else {
                timestamped_path(epub)
            };
            pack_epub(workdir.path(), &out)?;
            println!("Wrote {}", out.display());
            info!(file = %out.display(), images = saved.len(), "replenished");
        }
    }

    Ok(())
}

/// Logging goes to a persistent line-oriented file for post-hoc auditing;
/// stdout carries the user-facing summaries. If the log file cannot be
/// opened, events fall back to stderr.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE);

    match file {
        Ok(file) => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(filter),
            )
            .init(),
        Err(_) => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
            .init(),
    }
}
