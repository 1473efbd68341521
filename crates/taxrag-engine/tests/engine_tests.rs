use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taxrag_core::config::Settings;
use taxrag_core::store::ChunkStore;
use taxrag_core::traits::{Embedder, LoadedCorpus, VectorIndex};
use taxrag_core::types::{Chunk, SearchHit};
use taxrag_embed::FakeEmbedder;
use taxrag_engine::{AnswerKind, Corpus, CorpusStatus, RagEngine, SessionStore};
use taxrag_vector::FlatIndex;

/// Records every text it embeds; returns a constant vector.
#[derive(Default)]
struct RecordingEmbedder {
    seen: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingEmbedder {
    fn calls(&self) -> usize {
        self.seen.lock().expect("lock").len()
    }

    fn last(&self) -> Option<String> {
        self.seen.lock().expect("lock").last().cloned()
    }
}

impl Embedder for RecordingEmbedder {
    fn dim(&self) -> usize {
        4
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.seen.lock().expect("lock").push(text.to_string());
        if self.fail {
            anyhow::bail!("model offline");
        }
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }
}

/// Returns the same scripted hits for every query.
struct ScriptedIndex {
    hits: Vec<SearchHit>,
    searches: Arc<AtomicUsize>,
}

impl VectorIndex for ScriptedIndex {
    fn len(&self) -> usize {
        self.hits.len()
    }

    fn search(&self, _query: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(k).copied().collect())
    }
}

const CHUNKS: [(&str, f32); 4] = [
    ("Section 80C allows a deduction for payments towards life insurance premia, provident fund and similar savings.", 0.2),
    ("Deductions under Chapter VI-A are allowed from the gross total income of an assessee.", 0.5),
    ("A claim for deduction must be made in the return of income filed under section 139.", 0.9),
    ("Unrelated schedule text about customs tariffs that rarely matters here.", 3.0),
];

fn scripted_corpus(chunks: &[(&str, f32)]) -> (Corpus, Arc<AtomicUsize>) {
    let searches = Arc::new(AtomicUsize::new(0));
    let store = ChunkStore::from_chunks(
        chunks.iter().enumerate().map(|(i, (text, _))| Chunk::new(i, *text).with_page(10 + i as u32)),
    );
    let hits = chunks.iter().enumerate().map(|(id, (_, distance))| SearchHit { id, distance: *distance }).collect();
    let index = ScriptedIndex { hits, searches: Arc::clone(&searches) };
    let loaded = LoadedCorpus { index: Arc::new(index), store, source_name: None };
    (Corpus::from_loaded("ITA_primary", loaded), searches)
}

fn engine_with(embedder: Arc<RecordingEmbedder>, chunks: &[(&str, f32)]) -> (RagEngine, Arc<AtomicUsize>) {
    let (corpus, searches) = scripted_corpus(chunks);
    (RagEngine::new(embedder, corpus, Settings::default()), searches)
}

#[test]
fn relevant_chunks_are_bounded_thresholded_and_sorted() {
    let embedder = FakeEmbedder::new(64);
    let texts = [
        "Section 80C deduction for life insurance premium",
        "Section 80D deduction for health insurance premium",
        "House rent allowance exemption under section 10",
        "Interest on housing loan under section 24",
        "Capital gains on sale of listed shares",
        "Tax deducted at source on salary payments",
        "Advance tax instalments and due dates",
    ];
    let vectors = embedder.embed_batch(&texts.map(String::from)).expect("embed");
    let loaded = LoadedCorpus {
        index: Arc::new(FlatIndex::from_vectors(vectors).expect("index")),
        store: ChunkStore::from_chunks(texts.iter().enumerate().map(|(i, t)| Chunk::new(i, *t))),
        source_name: None,
    };
    let settings = Settings::default();
    let threshold = settings.retrieval.similarity_threshold;
    let mut engine = RagEngine::new(Arc::new(embedder), Corpus::from_loaded("ITA_primary", loaded), settings);

    for top_k in 0..=8 {
        let results = engine.find_relevant_chunks("section 80C deduction premium", top_k);
        assert!(results.len() <= top_k);
        assert!(results.iter().all(|r| r.score >= threshold));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
    let top = engine.find_relevant_chunks("section 80C deduction premium", 3);
    assert_eq!(top.first().map(|r| r.chunk_id()), Some(0));
}

#[test]
fn scores_fuse_similarity_and_keyword_boost() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    let results = engine.find_relevant_chunks("Section 80C", 5);
    // chunk 3 falls below the similarity threshold
    assert_eq!(results.len(), 3);
    let best = &results[0];
    assert_eq!(best.chunk_id(), 0);
    assert!((best.base_similarity - 1.0 / 1.2).abs() < 1e-6);
    assert!((best.keyword_boost - 1.0).abs() < 1e-6);
    assert!((best.score - best.base_similarity * 1.2).abs() < 1e-6);
    // the enhancer ran once, before embedding
    assert_eq!(embedder.last().as_deref(), Some("Section 80C context: deduction 80c"));
}

#[test]
fn identical_ask_is_served_from_cache() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, searches) = engine_with(Arc::clone(&embedder), &CHUNKS);

    let first = engine.ask("What is Section 80C?", 5, true);
    let second = engine.ask("What is Section 80C?", 5, true);
    assert_eq!(first.kind, AnswerKind::Answered);
    assert_eq!(first, second);
    assert_eq!(embedder.calls(), 1);
    assert_eq!(searches.load(Ordering::SeqCst), 1);
    assert_eq!(engine.stats().cache_hits, 1);

    // case-insensitive key, different top_k is a different key
    engine.find_relevant_chunks("WHAT IS SECTION 80C?", 5);
    assert_eq!(embedder.calls(), 1);
    engine.find_relevant_chunks("What is Section 80C?", 2);
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn greeting_gets_help_prompt_without_retrieval() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, searches) = engine_with(Arc::clone(&embedder), &CHUNKS);
    let out = engine.ask("hi", 5, true);
    assert_eq!(out.kind, AnswerKind::Vague);
    assert!(out.text.contains("What is Section 80C?"));
    assert_eq!(engine.conversation_summary().total_queries, 0);
    assert_eq!(embedder.calls(), 0);
    assert_eq!(searches.load(Ordering::SeqCst), 0);
    assert_eq!(engine.stats().vague, 1);
}

#[test]
fn gibberish_falls_back_echoing_the_query() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let far = [("Section 80C allows a deduction for life insurance premia.", 5.0), ("Rebate under section 87A.", 6.0)];
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &far);
    let out = engine.ask("asdkjasd", 5, true);
    assert_eq!(out.kind, AnswerKind::NoResults);
    assert!(out.text.contains("\"asdkjasd\""));
    assert_eq!(engine.conversation_summary().total_queries, 0);
    assert_eq!(engine.stats().fallbacks, 1);
}

#[test]
fn weak_matches_use_the_low_confidence_template() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let weak = [("Rebate under section 87A is available to residents.", 2.0)];
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &weak);
    let out = engine.ask("surcharge on lottery winnings", 5, true);
    assert_eq!(out.kind, AnswerKind::LowConfidence);
    assert!(out.text.contains("\"surcharge on lottery winnings\""));
    assert_eq!(out.chunks_used, 1);
    assert!(out.sources.is_empty());
}

#[test]
fn follow_up_is_fused_with_previous_query() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    assert_eq!(engine.ask("What is Section 80C?", 5, true).kind, AnswerKind::Answered);

    let out = engine.ask("How do I claim it?", 5, true);
    assert!(out.query.contains("previous context: What is Section 80C?"));
    let embedded = embedder.last().expect("embedded");
    assert!(embedded.contains("previous context: What is Section 80C?"));

    let summary = engine.conversation_summary();
    assert_eq!(summary.total_queries, 2);
    // history keeps what the user typed
    assert_eq!(summary.recent_queries, vec!["What is Section 80C?", "How do I claim it?"]);

    let plain = engine.ask("How do I claim it?", 5, false);
    assert_eq!(plain.query, "How do I claim it?");
}

#[test]
fn clear_history_resets_summary_and_cache() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    engine.ask("What is Section 80C?", 5, true);
    assert_eq!(engine.conversation_summary().total_queries, 1);

    engine.clear_history();
    assert_eq!(engine.conversation_summary().total_queries, 0);
    assert!(engine.session().cache().is_empty());
    engine.ask("What is Section 80C?", 5, true);
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn answered_text_carries_sources() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    let out = engine.ask("How to claim deduction under section 80C", 5, true);
    assert_eq!(out.kind, AnswerKind::Answered);
    assert_eq!(out.sources.len(), 3);
    assert_eq!(out.sources[0].number, 1);
    assert_eq!(out.chunks_used, 3);
    assert!(out.text.starts_with("**Process/Steps:**"));
    assert!(out.text.contains("*Sources: Income Tax Act - Page 10"));
    let avg = out.sources.iter().map(|s| s.score).sum::<f32>() / 3.0;
    assert!((out.confidence_avg - avg).abs() < 1e-6);
}

#[test]
fn duplicate_prefixes_are_collapsed() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let shared = "Section 10(13A) exempts house rent allowance received by a salaried employee subject to the limits prescribed";
    let a = format!("{shared} in rule 2A.");
    let b = format!("{shared} for metro cities.");
    let chunks = [(a.as_str(), 0.1), (b.as_str(), 0.2), ("HRA is not exempt when no rent is actually paid by the employee.", 0.3)];
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &chunks);
    let ids: Vec<usize> = engine.find_relevant_chunks("HRA exemption", 5).iter().map(|r| r.chunk_id()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&0) && ids.contains(&2));
}

#[test]
fn embedder_failure_degrades_and_is_not_cached() {
    let embedder = Arc::new(RecordingEmbedder { seen: Mutex::default(), fail: true });
    let (mut engine, searches) = engine_with(Arc::clone(&embedder), &CHUNKS);
    let out = engine.ask("What is Section 80C?", 5, true);
    assert_eq!(out.kind, AnswerKind::NoResults);
    engine.ask("What is Section 80C?", 5, true);
    assert_eq!(embedder.calls(), 2);
    assert_eq!(searches.load(Ordering::SeqCst), 0);
}

#[test]
fn degraded_corpus_answers_with_fallback() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let mut engine = RagEngine::new(
        Arc::clone(&embedder) as Arc<dyn Embedder>,
        Corpus::degraded("ITA_primary", "vectors missing"),
        Settings::default(),
    );
    assert!(matches!(engine.corpus_status(), CorpusStatus::Degraded(_)));
    let out = engine.ask("What is Section 80C?", 5, true);
    assert_eq!(out.kind, AnswerKind::NoResults);
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn switching_documents_discards_cache_and_history() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    engine.ask("What is Section 80C?", 5, true);

    let (other, _) = scripted_corpus(&CHUNKS[..2]);
    engine.switch_document(other);
    assert_eq!(engine.conversation_summary().total_queries, 0);
    assert!(engine.session().cache().is_empty());
    engine.ask("What is Section 80C?", 5, true);
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn sessions_keep_separate_histories_but_share_the_cache() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    let mut store = SessionStore::new();

    engine.ask_in_session(&mut store, "alice", "What is Section 80C?", 5, true);
    let bob = engine.ask_in_session(&mut store, "bob", "How do I claim it?", 5, true);
    assert!(!bob.query.contains("previous context"));
    assert_eq!(store.get("alice").len(), 1);
    assert_eq!(engine.conversation_summary().total_queries, 0);

    engine.ask_in_session(&mut store, "carol", "What is Section 80C?", 5, true);
    assert_eq!(engine.stats().cache_hits, 1);
    assert!(store.delete("alice"));
}

#[test]
fn single_tax_word_gets_help_prompt_and_no_history() {
    let embedder = Arc::new(RecordingEmbedder::default());
    let (mut engine, _) = engine_with(Arc::clone(&embedder), &CHUNKS);
    for word in ["HRA", "80C", "tax"] {
        let out = engine.ask(word, 5, true);
        assert_eq!(out.kind, AnswerKind::Vague, "{word}");
        assert!(out.text.contains("What is Section 80C?"));
        assert!(out.sources.is_empty());
    }
    assert_eq!(engine.conversation_summary().total_queries, 0);
    let stats = engine.stats();
    assert_eq!((stats.vague, stats.answered, stats.fallbacks), (3, 0, 0));
}

fn tied_engine() -> RagEngine {
    // every chunk mentions one of the three query terms and sits at the same distance
    let texts = [
        "Alpha schedule: pension paid by a former employer.",
        "Beta schedule: family pension received by a dependant.",
        "Gamma schedule: pension from a foreign government.",
    ];
    let store = ChunkStore::from_chunks(texts.iter().enumerate().map(|(i, t)| Chunk::new(i, *t)));
    let hits = [2, 0, 1].into_iter().map(|id| SearchHit { id, distance: 0.5 }).collect();
    let index = ScriptedIndex { hits, searches: Arc::new(AtomicUsize::new(0)) };
    let loaded = LoadedCorpus { index: Arc::new(index), store, source_name: None };
    RagEngine::new(
        Arc::new(RecordingEmbedder::default()),
        Corpus::from_loaded("ITA_primary", loaded),
        Settings::default(),
    )
}

#[test]
fn equal_scores_keep_index_return_order() {
    let query = "pension commutation rules";
    let first: Vec<(usize, f32)> =
        tied_engine().find_relevant_chunks(query, 3).iter().map(|r| (r.chunk_id(), r.score)).collect();

    assert_eq!(first.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![2, 0, 1]);
    assert!(first.windows(2).all(|w| w[0].1 == w[1].1));
    let expected = (1.0 / 1.5) * (1.0 + 0.2 / 3.0);
    assert!((first[0].1 - expected).abs() < 1e-6);

    // a fresh engine with an empty cache reproduces scores and order exactly
    let again: Vec<(usize, f32)> =
        tied_engine().find_relevant_chunks(query, 3).iter().map(|r| (r.chunk_id(), r.score)).collect();
    assert_eq!(first, again);
}
