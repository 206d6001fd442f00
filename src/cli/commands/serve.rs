//! HTTP API server command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use crate::server::router;
use std::sync::Arc;
use tracing::warn;

/// Run the HTTP API server, optionally indexing a docs folder first.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    docs: Option<String>,
    static_dir: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let docs = docs.or_else(|| settings.server.docs_dir.clone());
    let static_dir = static_dir
        .or_else(|| settings.server.static_dir.clone())
        .map(|d| Settings::expand_path(&d));

    let rag = Arc::new(RagSystem::new(&settings)?);

    if let Some(docs) = docs {
        let folder = Settings::expand_path(&docs);
        let spinner = Output::spinner(&format!("Loading courses from {}...", folder.display()));
        let result = rag.add_course_folder(&folder, false).await;
        spinner.finish_and_clear();

        match result {
            Ok(summary) => Output::success(&format!(
                "Loaded {} new courses ({} chunks)",
                summary.courses, summary.chunks
            )),
            Err(e) => {
                warn!("Failed to load documents from {}: {}", folder.display(), e);
                Output::warning(&format!("Could not load documents: {}", e));
            }
        }
    }

    let app = router(rag, static_dir.as_deref());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Syllabus API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Query", "POST   /api/query");
    Output::kv("Courses", "GET    /api/courses");
    Output::kv("Clear session", "DELETE /api/session/{session_id}");
    Output::kv("Health", "GET    /api/health");
    if let Some(dir) = &static_dir {
        Output::kv("Static files", &dir.display().to_string());
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
