//! The RAG system: wires the store, tools, generator and sessions together.

use crate::agent::{AiGenerator, CourseOutlineTool, CourseSearchTool, Source, ToolRegistry};
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::ingest::{CourseIndexer, DocumentProcessor, IngestSummary};
use crate::llm::{AnthropicClient, ChatModel};
use crate::session::SessionManager;
use crate::vector_store::{create_store, Course, VectorStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// An answer and the sources the tools surfaced while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Catalog statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Question answering over the course catalog.
pub struct RagSystem {
    store: Arc<dyn VectorStore>,
    indexer: CourseIndexer,
    tools: ToolRegistry,
    generator: AiGenerator,
    sessions: SessionManager,
    prompts: Prompts,
    query_lock: Mutex<()>,
}

impl RagSystem {
    /// Build the system from settings: Anthropic for answers, OpenAI for
    /// embeddings, and the configured vector store.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let model: Arc<dyn ChatModel> = Arc::new(AnthropicClient::from_settings(&settings.anthropic)?);
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);
        let store = create_store(settings, embedder)?;

        Self::with_components(settings, prompts, model, store)
    }

    /// Build the system from explicit components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        model: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let mut tools = ToolRegistry::new();
        tools.register(CourseSearchTool::new(store.clone()));
        tools.register(CourseOutlineTool::new(store.clone()));

        let generator =
            AiGenerator::from_settings(model, &settings.anthropic).with_system_prompt(&prompts.system);

        let indexer = CourseIndexer::new(
            store.clone(),
            DocumentProcessor::from_settings(&settings.chunking)?,
        );

        Ok(Self {
            store,
            indexer,
            tools,
            generator,
            sessions: SessionManager::new(settings.session.max_history),
            prompts,
            query_lock: Mutex::new(()),
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer a question, using and updating the session's history when a
    /// session id is given.
    #[instrument(skip(self, query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryResponse> {
        let _guard = self.query_lock.lock().await;

        let prompt = self.prompts.render_query(query);
        let history = match session_id {
            Some(id) => self.sessions.get_conversation_history(id)?,
            None => None,
        };

        let definitions = self.tools.definitions();
        let result = self
            .generator
            .generate_response(&prompt, history.as_deref(), &definitions, Some(&self.tools))
            .await;

        let sources = self.tools.last_sources();
        self.tools.reset_sources();
        let answer = result?;

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer)?;
        }

        info!("Answered with {} sources", sources.len());
        Ok(QueryResponse { answer, sources })
    }

    /// Number of courses and their titles.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.store.existing_course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    /// Ingest a single course document. Returns the course and chunk count.
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        self.indexer.add_course_document(path).await
    }

    /// Ingest every course document in a folder, skipping known titles
    /// unless `clear` is set.
    pub async fn add_course_folder(&self, path: &Path, clear: bool) -> Result<IngestSummary> {
        self.indexer.add_course_folder(path, clear).await
    }
}
