//! Index command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::{CourseIndexer, DocumentProcessor};
use anyhow::Result;

/// Run the index command.
pub async fn run_index(path: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if settings.vector_store.provider.eq_ignore_ascii_case("memory") {
        Output::warning("The memory vector store is not persisted; indexed courses are lost on exit.");
    }

    let folder = Settings::expand_path(path);
    let indexer = CourseIndexer::new(
        open_store(&settings)?,
        DocumentProcessor::from_settings(&settings.chunking)?,
    );

    let spinner = Output::spinner(&format!("Indexing {}...", folder.display()));
    let result = indexer.add_course_folder(&folder, clear).await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) if summary.courses == 0 => {
            Output::info("No new courses to index.");
        }
        Ok(summary) => {
            Output::success(&format!(
                "Indexed {} courses ({} chunks)",
                summary.courses, summary.chunks
            ));
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
