use std::sync::Arc;

use serde::Serialize;

use taxrag_core::config::Settings;
use taxrag_core::error::Result;
use taxrag_core::traits::{CorpusLoader, Embedder};
use taxrag_core::types::RankedResult;
use taxrag_vector::Catalog;

use crate::answer::{AnswerKind, AnswerResult};
use crate::cache::QueryCache;
use crate::compose::AnswerComposer;
use crate::conversation::{ConversationState, ConversationSummary};
use crate::corpus::{Corpus, CorpusStatus};
use crate::retriever::{RetrievalOutcome, ScoredRetriever};
use crate::session_store::SessionStore;

/// Per-engine counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_queries: u64,
    pub answered: u64,
    pub fallbacks: u64,
    pub vague: u64,
    pub cache_hits: u64,
}

/// One active document binding: its corpus plus the cache and history built against it.
pub struct EngineSession {
    corpus: Arc<Corpus>,
    cache: QueryCache,
    conversation: ConversationState,
}

impl EngineSession {
    pub fn new(corpus: Corpus, settings: &Settings) -> Self {
        Self { corpus: Arc::new(corpus), cache: QueryCache::new(&settings.cache), conversation: ConversationState::new() }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }
}

/// Retrieval-and-answer engine over one document at a time.
///
/// Not internally synchronized: hosts serving concurrent callers wrap it in a
/// lock or keep one engine per caller.
pub struct RagEngine {
    settings: Settings,
    retriever: ScoredRetriever,
    composer: AnswerComposer,
    session: EngineSession,
    stats: EngineStats,
}

impl RagEngine {
    pub fn new(embedder: Arc<dyn Embedder>, corpus: Corpus, settings: Settings) -> Self {
        let retriever = ScoredRetriever::new(embedder, settings.retrieval.clone());
        let composer = AnswerComposer::new(settings.answer.clone());
        let session = EngineSession::new(corpus, &settings);
        Self { settings, retriever, composer, session, stats: EngineStats::default() }
    }

    /// Resolve `document` in the catalog (falling back to the newest store)
    /// and build an engine over it. Fails only when no store exists.
    pub fn open(
        settings: Settings,
        catalog: &Catalog,
        loader: &dyn CorpusLoader,
        embedder: Arc<dyn Embedder>,
        document: &str,
    ) -> Result<Self> {
        let corpus = Corpus::open(catalog, loader, document)?;
        Ok(Self::new(embedder, corpus, settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn document_id(&self) -> &str {
        self.session.corpus.document_id()
    }

    pub fn corpus_status(&self) -> &CorpusStatus {
        self.session.corpus.status()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Replace the session wholesale; the previous cache and history are dropped.
    pub fn switch_document(&mut self, corpus: Corpus) {
        tracing::info!(from = %self.document_id(), to = %corpus.document_id(), "switching document");
        self.session = EngineSession::new(corpus, &self.settings);
    }

    pub fn ask(&mut self, query: &str, top_k: usize, use_context: bool) -> AnswerResult {
        let mut conversation = std::mem::take(&mut self.session.conversation);
        let answer = self.answer_with(&mut conversation, query, top_k, use_context);
        self.session.conversation = conversation;
        answer
    }

    /// Like `ask`, but against a conversation held in `store` under `session_id`.
    /// The retrieval cache is still the engine's.
    pub fn ask_in_session(
        &mut self,
        store: &mut SessionStore,
        session_id: &str,
        query: &str,
        top_k: usize,
        use_context: bool,
    ) -> AnswerResult {
        self.answer_with(store.get(session_id), query, top_k, use_context)
    }

    pub fn find_relevant_chunks(&mut self, query: &str, top_k: usize) -> Vec<RankedResult> {
        self.lookup(query, top_k)
    }

    pub fn conversation_summary(&self) -> ConversationSummary {
        self.session.conversation.summarize()
    }

    /// Empty both the conversation history and the query cache.
    pub fn clear_history(&mut self) {
        self.session.conversation.clear();
        self.session.cache.clear();
        tracing::info!(document = %self.document_id(), "history and cache cleared");
    }

    fn answer_with(
        &mut self,
        conversation: &mut ConversationState,
        query: &str,
        top_k: usize,
        use_context: bool,
    ) -> AnswerResult {
        self.stats.total_queries += 1;
        let fused = if use_context { conversation.fuse(query) } else { query.to_string() };

        if self.composer.is_vague(&fused) {
            self.stats.vague += 1;
            tracing::debug!(query, "vague query, skipping retrieval");
            return self.composer.vague(&fused);
        }

        let results = self.lookup(&fused, top_k);
        let answer = self.composer.compose(query, &fused, &results);
        if answer.kind == AnswerKind::Answered {
            conversation.record(query, results.len());
            self.stats.answered += 1;
        } else if answer.kind.is_fallback() {
            self.stats.fallbacks += 1;
        } else {
            self.stats.vague += 1;
        }
        tracing::info!(kind = ?answer.kind, chunks = answer.chunks_used, confidence = answer.confidence_avg, "answered query");
        answer
    }

    fn lookup(&mut self, query: &str, top_k: usize) -> Vec<RankedResult> {
        if let Some(cached) = self.session.cache.get(query, top_k) {
            self.stats.cache_hits += 1;
            tracing::debug!(query, top_k, "cache hit");
            return cached.to_vec();
        }
        tracing::debug!(query, top_k, "cache miss");
        match self.retriever.retrieve(&self.session.corpus, query, top_k) {
            RetrievalOutcome::Ranked(results) => {
                self.session.cache.put(query, top_k, results.clone());
                results
            }
            RetrievalOutcome::NoIndex => {
                tracing::debug!(document = %self.document_id(), "no usable index");
                Vec::new()
            }
            RetrievalOutcome::Failed(reason) => {
                tracing::warn!(reason = %reason, "retrieval failed, answering without chunks");
                Vec::new()
            }
        }
    }
}
